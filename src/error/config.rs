//! Configuration loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a [`WatchdogConfig`](crate::config::WatchdogConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected shape.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An environment override holds an unusable value.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },
}

impl ConfigError {
    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "E_CONFIG_READ",
            ConfigError::Parse { .. } => "E_CONFIG_PARSE",
            ConfigError::InvalidEnv { .. } => "E_CONFIG_ENV",
        }
    }
}
