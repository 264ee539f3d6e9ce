//! Startup configuration read from `PROFILE_*` environment variables.
//!
//! # Invariants
//! - Blank values count as unset.
//! - Every rejected value names its variable.

use profile_core::{default_log_level, BackendConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "PROFILE_BIND_ADDR";
pub const ENV_DB_PATH: &str = "PROFILE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PROFILE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PROFILE_LOG_DIR";
pub const ENV_SESSION_TTL_SECS: &str = "PROFILE_SESSION_TTL_SECS";
pub const ENV_SESSION_PRUNE_SECS: &str = "PROFILE_SESSION_PRUNE_SECS";
pub const ENV_COOKIE_SECURE: &str = "PROFILE_COOKIE_SECURE";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_SESSION_PRUNE_SECS: u64 = 24 * 60 * 60;
/// Upper bound for every duration setting: ten years.
const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {}=`{}`: {}",
            self.variable, self.value, self.reason
        )
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: BackendConfig,
    pub log_level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<String>,
    pub session_ttl: Duration,
    pub session_prune_interval: Duration,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_raw = read(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|err| invalid(ENV_BIND_ADDR, &bind_raw, err.to_string()))?;

        let backend = match read(ENV_DB_PATH) {
            Some(path) => BackendConfig::Document {
                path: PathBuf::from(path),
            },
            None => BackendConfig::Memory,
        };

        Ok(Self {
            bind_addr,
            backend,
            log_level: read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: read(ENV_LOG_DIR),
            session_ttl: seconds(ENV_SESSION_TTL_SECS, read(ENV_SESSION_TTL_SECS), DEFAULT_SESSION_TTL_SECS)?,
            session_prune_interval: seconds(
                ENV_SESSION_PRUNE_SECS,
                read(ENV_SESSION_PRUNE_SECS),
                DEFAULT_SESSION_PRUNE_SECS,
            )?,
            cookie_secure: flag(ENV_COOKIE_SECURE, read(ENV_COOKIE_SECURE))?,
        })
    }
}

fn invalid(variable: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError {
        variable,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn seconds(
    variable: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::from_secs(default));
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(invalid(variable, &raw, "must be greater than zero")),
        Ok(secs) if secs > MAX_DURATION_SECS => Err(invalid(
            variable,
            &raw,
            format!("must be at most {MAX_DURATION_SECS} (ten years)"),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(invalid(variable, &raw, err.to_string())),
    }
}

fn flag(variable: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(variable, &raw, "expected true|false|1|0")),
    }
}
