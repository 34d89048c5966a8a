//! Error types for gitbridge.

use thiserror::Error;

/// Main error type for gitbridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Upstream API returned an error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Requested resource does not exist upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream rate limit exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream returned data we could not interpret
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A collaborator required by the operation is not configured
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Map a non-success HTTP status from an upstream API to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Error::Auth(message),
            404 => Error::NotFound(message),
            429 => Error::RateLimited(message),
            _ => Error::Api { status, message },
        }
    }
}

/// Result type alias for gitbridge operations.
pub type Result<T> = std::result::Result<T, Error>;
