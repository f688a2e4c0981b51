//! Store error types.

use bytewatch_core::CoreError;
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store refused a write.
    #[error("Write rejected: {0}")]
    WriteRejected(String),

    /// The backing store could not be read.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain validation error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Stored record has an unexpected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl StoreError {
    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::WriteRejected(_) | StoreError::ReadFailed(_) | StoreError::Io(_)
        )
    }
}
