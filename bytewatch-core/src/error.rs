//! Core error types for ByteWatch.

use thiserror::Error;

/// Core error type for ByteWatch operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A limit value was rejected.
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed input data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
