//! Error types for the Coverity Connect client.

use crate::safety::sanitize_reqwest_error;
use thiserror::Error;

/// Configuration problems detected before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more mandatory inputs are absent. All of them are reported at once.
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// An input is present but cannot be interpreted.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Main error type for remote operations.
#[derive(Error, Debug)]
pub enum CoverityError {
    /// Configuration errors (missing fields, unparsable values, unreadable CA bundle)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The remote rejected the configured credentials (HTTP 401)
    #[error("Authentication failed: the server rejected the configured credentials")]
    AuthenticationFailed,

    /// The remote answered with a non-success status
    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// The remote answered 2xx with a body that does not have the expected shape
    #[error("Remote error: malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    /// DNS, connect, TLS or timeout failures
    #[error("Connection error: {0}")]
    Connection(String),
}

impl CoverityError {
    /// Stable machine-readable category used in tool failure bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration_error",
            Self::AuthenticationFailed => "authentication_failed",
            Self::Remote { .. } | Self::Malformed { .. } => "remote_error",
            Self::Connection(_) => "connection_error",
        }
    }

    /// HTTP status attached to the failure, when the remote produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed => Some(401),
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CoverityError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Malformed {
                endpoint: value
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_default(),
                reason: sanitize_reqwest_error(&value),
            };
        }
        Self::Connection(sanitize_reqwest_error(&value))
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, CoverityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_every_field() {
        let err = ConfigError::Missing(vec!["COVERITY_HOST", "COVAUTHKEY"]);
        assert_eq!(
            err.to_string(),
            "missing required configuration: COVERITY_HOST, COVAUTHKEY"
        );
    }

    #[test]
    fn kinds_are_distinct_per_failure_class() {
        assert_eq!(
            CoverityError::AuthenticationFailed.kind(),
            "authentication_failed"
        );
        let remote = CoverityError::Remote {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(remote.kind(), "remote_error");
        assert_eq!(remote.status(), Some(503));
        assert_eq!(
            CoverityError::Connection("refused".to_string()).kind(),
            "connection_error"
        );
    }
}
