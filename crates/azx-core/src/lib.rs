//! azx-core — shared types for the Azure VPN exporter.
//!
//! - [`Credentials`]: service principal identifiers, loaded once at startup
//! - [`ExporterConfig`]: timeouts, endpoints and metric namespace
//! - [`VpnConnection`] and [`ResourceId`]: the modelled resource and the
//!   fields derived from its identifier

pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

pub use config::{ExporterConfig, parse_duration};
pub use credentials::Credentials;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
