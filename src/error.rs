//! API error type
//!
//! Every failure a handler can produce maps to a status code and the JSON
//! envelope `{"success": false, "message": ...}`.

use crate::storage::StorageError;
use hyper::StatusCode;
use thiserror::Error;

/// Fallback message for errors that carry no text of their own
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad extension, missing file, malformed multipart, invalid filename
    #[error("{0}")]
    Validation(String),

    /// Upload over the configured size limit
    #[error("File size is too large. Maximum size is {limit_mb}MB")]
    PayloadTooLarge { limit_mb: u64 },

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed { allow: &'static str },

    /// Filesystem failure, `message` is what the client sees
    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Anything else, reported with a best-effort message
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub const fn payload_too_large(limit_bytes: u64) -> Self {
        Self::PayloadTooLarge {
            limit_mb: limit_bytes / (1024 * 1024),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Storage { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message, never empty
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Text for the error log, includes the underlying cause when there is one
    pub fn log_detail(&self) -> String {
        match self {
            Self::Storage { message, source } => format!("{message}: {source}"),
            other => other.message(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidName(_) => Self::validation("Invalid filename"),
            StorageError::InvalidExtension(_) => {
                Self::validation("Invalid file type. Only GLTF and GLB files are allowed.")
            }
            StorageError::TooLarge { limit } => Self::payload_too_large(limit),
            StorageError::NotFound(_) => Self::NotFound("Model not found".to_string()),
            StorageError::Prepare(source) => Self::Storage {
                message: "Server error while accessing models",
                source,
            },
            StorageError::ReadDir(source) => Self::Storage {
                message: "Failed to read models directory",
                source,
            },
            StorageError::Read(source) => Self::Storage {
                message: "Failed to read model",
                source,
            },
            StorageError::Write(source) => Self::Storage {
                message: "Failed to save uploaded file",
                source,
            },
            StorageError::Delete(source) => Self::Storage {
                message: "Failed to delete model",
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::validation("No file uploaded").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::payload_too_large(50 * 1024 * 1024).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("Model not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StorageError::Delete(io::Error::other("denied"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_size_limit_message() {
        assert_eq!(
            ApiError::payload_too_large(52_428_800).message(),
            "File size is too large. Maximum size is 50MB"
        );
    }

    #[test]
    fn test_storage_messages() {
        let err = ApiError::from(StorageError::ReadDir(io::Error::other("eio")));
        assert_eq!(err.message(), "Failed to read models directory");
        assert!(err.log_detail().contains("eio"));

        let err = ApiError::from(StorageError::Prepare(io::Error::other("eacces")));
        assert_eq!(err.message(), "Server error while accessing models");

        let err = ApiError::from(StorageError::NotFound("x.glb".into()));
        assert_eq!(err.message(), "Model not found");
    }

    #[test]
    fn test_empty_message_falls_back() {
        assert_eq!(ApiError::Internal(String::new()).message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(ApiError::Internal("boom".into()).message(), "boom");
        assert_eq!(
            ApiError::Internal(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
