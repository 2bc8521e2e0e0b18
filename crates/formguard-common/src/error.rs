//! Common error types for Formguard components.
//!
//! Protocol rejections (expired form, bad token, invalid data) are not
//! errors; see [`crate::types::Failure`]. This type covers the
//! infrastructure around the protocol.

use thiserror::Error;

/// Common errors across Formguard components
#[derive(Debug, Error)]
pub enum FormGuardError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Form definition could not be parsed or has an invalid shape
    #[error("Form definition error: {0}")]
    Definition(String),

    /// Session store connection/operation error
    #[error("Session store error: {0}")]
    Store(String),

    /// DNS resolver could not be constructed
    #[error("DNS error: {0}")]
    Dns(String),

    /// Stored session data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FormGuardError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::Definition(_) => 500,
            Self::Store(_) => 503,
            Self::Dns(_) => 503,
            Self::Serialization(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Dns(_))
    }
}

impl From<serde_json::Error> for FormGuardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
