//! Exporter configuration file (TOML).
//!
//! Every field is optional; anything left out falls back to the defaults
//! below. Durations use the "500ms" / "5s" / "1m" syntax.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_MANAGEMENT_BASE_URL: &str = "https://management.azure.com";
pub const DEFAULT_NAMESPACE: &str = "azure";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CYCLE_DEADLINE: Duration = Duration::from_secs(30);

/// Raw file representation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExporterConfigFile {
    pub request_timeout: Option<String>,
    pub cycle_deadline: Option<String>,
    pub login_base_url: Option<String>,
    pub management_base_url: Option<String>,
    pub namespace: Option<String>,
}

/// Resolved exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Bound on every individual HTTP call.
    pub request_timeout: Duration,
    /// Bound on one whole scrape cycle (list + all detail fetches).
    pub cycle_deadline: Duration,
    pub login_base_url: String,
    pub management_base_url: String,
    /// Prefix of every exposed metric name.
    pub namespace: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cycle_deadline: DEFAULT_CYCLE_DEADLINE,
            login_base_url: DEFAULT_LOGIN_BASE_URL.to_string(),
            management_base_url: DEFAULT_MANAGEMENT_BASE_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::MalformedConfig { reason, .. } => ConfigError::MalformedConfig {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: ExporterConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::MalformedConfig {
                path: Default::default(),
                reason: e.to_string(),
            })?;
        Self::resolve(file)
    }

    fn resolve(file: ExporterConfigFile) -> ConfigResult<Self> {
        let defaults = Self::default();
        let request_timeout = match file.request_timeout {
            Some(v) => parse_duration(&v).ok_or(ConfigError::InvalidDuration {
                field: "request_timeout",
                value: v,
            })?,
            None => defaults.request_timeout,
        };
        let cycle_deadline = match file.cycle_deadline {
            Some(v) => parse_duration(&v).ok_or(ConfigError::InvalidDuration {
                field: "cycle_deadline",
                value: v,
            })?,
            None => defaults.cycle_deadline,
        };

        Ok(Self {
            request_timeout,
            cycle_deadline,
            login_base_url: file
                .login_base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.login_base_url),
            management_base_url: file
                .management_base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.management_base_url),
            namespace: file.namespace.unwrap_or(defaults.namespace),
        })
    }
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
