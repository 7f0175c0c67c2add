//! Runtime configuration for hosts embedding the board core.
//!
//! # Invariants
//! - Unset variables fall back to defaults; set-but-invalid ones are errors.
//! - `log_dir` is optional; hosts without one skip file logging.

use crate::db::{open_db_with, DbOptions, DbResult};
use crate::logging::default_log_level;
use crate::realtime::publisher::DEFAULT_CHANNEL_CAPACITY;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "COLLABBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "COLLABBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "COLLABBOARD_LOG_DIR";
pub const ENV_BUSY_TIMEOUT_MS: &str = "COLLABBOARD_BUSY_TIMEOUT_MS";
pub const ENV_EVENT_CAPACITY: &str = "COLLABBOARD_EVENT_CAPACITY";

const DEFAULT_DB_FILE: &str = "collabboard.sqlite3";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub busy_timeout: Duration,
    pub event_channel_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            busy_timeout: DbOptions::default().busy_timeout,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is present but cannot be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid {key} `{value}`: expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, keyed by the `COLLABBOARD_*` names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(value) = read(ENV_BUSY_TIMEOUT_MS) {
            let millis = parse_positive(ENV_BUSY_TIMEOUT_MS, &value, "milliseconds > 0")?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = read(ENV_EVENT_CAPACITY) {
            let capacity = parse_positive(ENV_EVENT_CAPACITY, &value, "an integer > 0")?;
            config.event_channel_capacity = usize::try_from(capacity).map_err(|_| {
                ConfigError::InvalidValue {
                    key: ENV_EVENT_CAPACITY,
                    value,
                    expected: "an integer that fits in usize",
                }
            })?;
        }
        Ok(config)
    }

    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: self.busy_timeout,
        }
    }

    /// Opens and migrates the configured database file.
    pub fn open_db(&self) -> DbResult<Connection> {
        open_db_with(&self.db_path, self.db_options())
    }
}

fn parse_positive(
    key: &'static str,
    value: &str,
    expected: &'static str,
) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            expected,
        }),
    }
}
