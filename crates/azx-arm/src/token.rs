//! Token manager — client-credentials grant against Azure AD.
//!
//! Tokens are short-lived and replaced wholesale on refresh. Refresh is
//! lazy: the API client checks expiry before every request (see
//! [`crate::client`]), there is no background refresh task.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use azx_core::Credentials;

use crate::error::{ArmError, ArmResult};

/// Resource scope requested for Resource Manager access.
pub const MANAGEMENT_RESOURCE: &str = "https://management.core.windows.net/";

/// A bearer token issued by the identity endpoint.
#[derive(Clone, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub resource: String,
    #[serde(rename = "access_token")]
    pub bearer: String,
    #[serde(default, deserialize_with = "unix_seconds")]
    pub expires_in: i64,
    /// Unix timestamp (seconds). A missing value decodes as 0, i.e. already expired.
    #[serde(default, deserialize_with = "unix_seconds")]
    pub expires_on: i64,
    #[serde(default, deserialize_with = "unix_seconds")]
    pub not_before: i64,
}

impl Token {
    /// The token is valid while `now < expires_on`.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_on
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("resource", &self.resource)
            .field("bearer", &"***")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Azure AD returns the timestamps as numeric strings; accept plain numbers too.
/// Fractional values are truncated to whole seconds.
fn unix_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Int(i64),
        Float(f64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(NumberOrString::Int(n)) => Ok(n),
        Some(NumberOrString::Float(f)) => Ok(f as i64),
        Some(NumberOrString::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            match s.parse::<i64>() {
                Ok(n) => Ok(n),
                Err(_) => s
                    .parse::<f64>()
                    .map(|f| f as i64)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

/// Build the v1 token endpoint for a tenant.
pub fn token_endpoint(login_base_url: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/token",
        login_base_url.trim_end_matches('/'),
        tenant_id
    )
}

/// Exchange client credentials for a token. Does not retry.
pub async fn acquire(
    http: &reqwest::Client,
    endpoint: &str,
    client_id: &str,
    client_secret: &str,
) -> ArmResult<Token> {
    debug!(%endpoint, "requesting authentication token");
    let form = [
        ("grant_type", "client_credentials"),
        ("resource", MANAGEMENT_RESOURCE),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];

    let resp = http
        .post(endpoint)
        .form(&form)
        .send()
        .await
        .map_err(|e| ArmError::Auth(format!("unable to get token: {e}")))?;
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .map_err(|e| ArmError::Auth(format!("unable to read token response: {e}")))?;
    let token: Token = serde_json::from_slice(&body)
        .map_err(|e| ArmError::Auth(format!("unable to decode token (http {status}): {e}")))?;

    debug!(expires_on = token.expires_on, "received new ARM token");
    Ok(token)
}

/// Where the API client gets fresh tokens from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire(&self) -> ArmResult<Token>;
}

/// Client-credentials grant for a service principal.
pub struct ClientCredentialsSource {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

impl ClientCredentialsSource {
    pub fn new(http: reqwest::Client, login_base_url: &str, credentials: Credentials) -> Self {
        Self {
            endpoint: token_endpoint(login_base_url, credentials.tenant_id()),
            http,
            credentials,
        }
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsSource {
    async fn acquire(&self) -> ArmResult<Token> {
        acquire(
            &self.http,
            &self.endpoint,
            self.credentials.client_id(),
            self.credentials.client_secret(),
        )
        .await
    }
}

/// Source of "now" as Unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}
