//! Error types for the ledger client

use thiserror::Error;

/// Ledger client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-2xx status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Server answered 2xx but reported the operation as unsuccessful
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Client could not be constructed from its configuration
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether the failure came from the response payload rather than transport
    pub fn is_malformed(&self) -> bool {
        match self {
            ClientError::Json(_) => true,
            ClientError::Http(e) => e.is_decode(),
            _ => false,
        }
    }
}

/// Result type for ledger client operations
pub type Result<T> = std::result::Result<T, ClientError>;
