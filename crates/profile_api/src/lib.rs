//! HTTP-agnostic JSON API over `profile_core`.
//!
//! # Responsibility
//! - Map `http` requests onto core use cases and render JSON responses.
//! - Own the cookie session contract and startup configuration.
//!
//! # Invariants
//! - Nothing here touches sockets; the server crate feeds complete requests.

pub mod app;
pub mod config;
pub mod cookie;
pub mod error;
pub mod routes;

pub use app::App;
pub use config::{AppConfig, ConfigError};
pub use cookie::{SessionCookie, SESSION_COOKIE_NAME};
pub use error::{ApiError, ApiResult};
pub use routes::{Resource, Route};
