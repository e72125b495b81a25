//! # Upload Errors

use thiserror::Error;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    #[error("Uploaded file is empty: {0}")]
    EmptyFile(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UploadError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::NotFound(_) => 404,
            UploadError::FileTooLarge(_, _) => 413,
            UploadError::EmptyFile(_) => 400,
            UploadError::InvalidPath(_) => 400,
            UploadError::IoError(_) => 500,
            UploadError::Internal(_) => 500,
        }
    }
}
