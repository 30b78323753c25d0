//! Service principal credentials.
//!
//! Loaded once at startup from a JSON file and never mutated afterwards.
//! The file uses the field names of the Azure CLI service principal dump
//! (`SubscriptionID`, `ClientID`, `ClientSecret`, `TenantID`); snake_case
//! names are accepted as well.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// The four identifiers needed to authenticate against Azure Resource Manager.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(rename = "SubscriptionID", alias = "subscription_id", default)]
    subscription_id: String,
    #[serde(rename = "ClientID", alias = "client_id", default)]
    client_id: String,
    #[serde(rename = "ClientSecret", alias = "client_secret", default)]
    client_secret: String,
    #[serde(rename = "TenantID", alias = "tenant_id", default)]
    tenant_id: String,
}

impl Credentials {
    /// Build credentials from their parts. Every field must be non-empty.
    pub fn new(
        subscription_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> ConfigResult<Self> {
        let creds = Self {
            subscription_id: subscription_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Load credentials from a JSON file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let creds: Credentials =
            serde_json::from_str(&content).map_err(|e| ConfigError::MalformedCredentials {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        creds.validate()?;
        debug!(path = %path.display(), credentials = ?creds, "credentials loaded");
        Ok(creds)
    }

    fn validate(&self) -> ConfigResult<()> {
        let fields = [
            ("SubscriptionID", &self.subscription_id),
            ("ClientID", &self.client_id),
            ("ClientSecret", &self.client_secret),
            ("TenantID", &self.tenant_id),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name));
            }
        }
        Ok(())
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}
