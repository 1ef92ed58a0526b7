//! Error types for event log operations.

use common::StorageError;

/// Error type for event log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The storage backend failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored record could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The caller supplied an invalid argument or configuration.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The log has been closed and accepts no further appends.
    #[error("Event log is closed")]
    Closed,
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Result type alias for event log operations.
pub type Result<T> = std::result::Result<T, Error>;
