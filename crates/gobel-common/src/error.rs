//! Error types shared across the gobel workspace

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, GobelError>;

/// Shared error type for cross-cutting utilities
#[derive(Error, Debug)]
pub enum GobelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GobelError {
    /// Configuration error from any displayable cause
    pub fn config(message: impl Into<String>) -> Self {
        GobelError::Config(message.into())
    }

    /// Invalid input error from any displayable cause
    pub fn invalid_input(message: impl Into<String>) -> Self {
        GobelError::InvalidInput(message.into())
    }
}
