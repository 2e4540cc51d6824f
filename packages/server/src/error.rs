use std::fmt;

use common::StorageError;

use crate::repo::RepoError;

/// Application-level error type.
///
/// The controller layer (out of scope here) maps these onto transport status
/// codes: `NotFound` → 404, `PermissionDenied` → 401/403,
/// `UnsupportedMediaType` → 415, `Corrupted` → 401/403, the rest → 400/500.
#[derive(Debug)]
pub enum AppError {
    /// Field-level constraint violation.
    Validation { field: String, message: String },
    /// The requester lacks the relationship required for the action.
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// Upload media type is not in the configured allow-list.
    UnsupportedMediaType(String),
    /// Stored artifact bytes no longer match the recorded checksum.
    Corrupted(String),
    Internal(String),
}

impl AppError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            AppError::Corrupted(_) => "CORRUPTED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { field, message } => write!(f, "{field}: {message}"),
            AppError::PermissionDenied => write!(f, "Insufficient permissions"),
            AppError::NotFound(msg) => write!(f, "{msg}"),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::UnsupportedMediaType(mime) => {
                write!(f, "Media type '{mime}' is not allowed")
            }
            AppError::Corrupted(name) => {
                write!(f, "Artifact '{name}' failed its integrity check")
            }
            AppError::Internal(detail) => write!(f, "Internal error: {detail}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::VersionConflict { .. } => AppError::Conflict(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => {
                AppError::NotFound(format!("Artifact '{name}' not found"))
            }
            StorageError::InvalidName(msg) => AppError::validation("filename", msg),
            StorageError::SizeLimitExceeded { actual, limit } => AppError::validation(
                "file",
                format!("File exceeds maximum size ({actual} > {limit} bytes)"),
            ),
            other => {
                tracing::error!("Storage failure: {other}");
                AppError::Internal(other.to_string())
            }
        }
    }
}
