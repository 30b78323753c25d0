//! Error types for Resource Manager calls.

use thiserror::Error;

/// Result type alias for Resource Manager operations.
pub type ArmResult<T> = Result<T, ArmError>;

/// Errors raised by the token manager, the API client and the fetcher.
#[derive(Debug, Error)]
pub enum ArmError {
    /// Identity endpoint unreachable, or its response was not a token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport failure on a Resource Manager call.
    #[error("network error: {0}")]
    Network(String),

    /// The per-request timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body did not have the expected shape.
    #[error("failed to decode {what} (http {status}): {reason}")]
    Decode {
        what: &'static str,
        status: u16,
        reason: String,
    },

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ArmError {
    /// Map a transport error from a Resource Manager call.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ArmError::Timeout(err.to_string())
        } else {
            ArmError::Network(err.to_string())
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ArmError::Auth(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ArmError::Network(_) | ArmError::Timeout(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, ArmError::Decode { .. })
    }
}
