//! Storage error types.

use thiserror::Error;

/// Model storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid filename: {0}")]
    InvalidName(String),

    #[error("extension not allowed: {0}")]
    InvalidExtension(String),

    #[error("upload exceeds limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("failed to prepare storage directory: {0}")]
    Prepare(#[source] std::io::Error),

    #[error("failed to read storage directory: {0}")]
    ReadDir(#[source] std::io::Error),

    #[error("failed to read model: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write model: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to delete model: {0}")]
    Delete(#[source] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
