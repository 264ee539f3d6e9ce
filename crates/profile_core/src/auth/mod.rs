//! Credential hashing and server-side sessions.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password, PasswordError};
pub use session::SessionStore;
