//! Error types for blog operations.

use common::StorageError;

/// Error type for blog operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Appending to or reading from the event log failed.
    #[error("Event log error: {0}")]
    Log(#[from] eventlog::Error),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The request carried invalid data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested operation or option is not supported.
    #[error("{0}")]
    Unsupported(String),

    /// No record exists for the requested key.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias for blog operations.
pub type Result<T> = std::result::Result<T, Error>;
