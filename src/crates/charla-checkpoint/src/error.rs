//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint persistence
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// No checkpoint exists for the requested thread
    #[error("No checkpoint found for thread '{0}'")]
    NotFound(String),

    /// Checkpoint could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Backend-specific error with context
    #[error("Backend error in '{backend}': {error}")]
    Backend {
        /// Name of the backend that failed
        backend: String,
        /// Underlying error description
        error: String,
    },
}

impl From<serde_json::Error> for CheckpointError {
    fn from(err: serde_json::Error) -> Self {
        CheckpointError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err.to_string())
    }
}
