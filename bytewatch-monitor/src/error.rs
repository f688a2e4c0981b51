//! Monitor error types.

use bytewatch_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the monitor and its views.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The monitor task is no longer running.
    #[error("Monitor is not running")]
    Closed,

    /// A feed line could not be decoded.
    #[error("Malformed feed line {line}: {message}")]
    Feed {
        /// 1-based line number.
        line: usize,
        /// Decoder message.
        message: String,
    },

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MonitorError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        MonitorError::Closed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for MonitorError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        MonitorError::Closed
    }
}
