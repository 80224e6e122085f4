//! Error types for the contact ledger

use thiserror::Error;

/// Result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the credit engine
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The remote ledger rejected or failed a paid operation
    #[error("Remote ledger error: {0}")]
    Remote(#[from] RemoteError),

    /// The durable local store could not be written
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// Paid operations need a signed-in user
    #[error("Operation requires an authenticated user")]
    NotAuthenticated,

    /// Credit purchase amount must be positive
    #[error("Invalid credit amount: {0}")]
    InvalidAmount(u32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures at the remote ledger adapter boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Backend unreachable or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a payload we could not interpret
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Backend refused the request
    #[error("Rejected by backend: {message}")]
    Rejected { status: Option<u16>, message: String },

    /// No remote ledger is configured (local-only mode)
    #[error("No remote ledger configured")]
    Unavailable,
}

/// Failures of the durable local store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store refused the write
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

#[cfg(feature = "http")]
impl From<ledger_client::ClientError> for RemoteError {
    fn from(err: ledger_client::ClientError) -> Self {
        use ledger_client::ClientError;

        if err.is_malformed() {
            return RemoteError::Malformed(err.to_string());
        }

        match err {
            ClientError::Server { status, message } => RemoteError::Rejected {
                status: Some(status),
                message,
            },
            ClientError::Rejected(message) => RemoteError::Rejected {
                status: None,
                message,
            },
            other => RemoteError::Network(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
