//! Error types for credential and config loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading startup configuration.
///
/// All of these are fatal: the exporter cannot start without valid
/// credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credentials in {path}: {reason}")]
    MalformedCredentials { path: PathBuf, reason: String },

    #[error("credentials field {0} is missing or empty")]
    MissingField(&'static str),

    #[error("malformed config in {path}: {reason}")]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("invalid duration {value:?} for {field}")]
    InvalidDuration { field: &'static str, value: String },
}
