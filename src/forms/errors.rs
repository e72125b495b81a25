//! # Form Service Errors

use thiserror::Error;

use crate::storage::StorageError;
use crate::uploads::UploadError;

/// Result type for form operations
pub type FormResult<T> = Result<T, FormError>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Unknown form type: {0}")]
    UnknownForm(String),

    #[error("Record not found: {form}/{id}")]
    NotFound { form: String, id: String },

    #[error("Invalid form body: {0}")]
    InvalidBody(String),

    #[error("Form type '{0}' does not accept file uploads")]
    UploadNotAccepted(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FormError {
    pub fn not_found(form: &str, id: &str) -> Self {
        Self::NotFound {
            form: form.to_string(),
            id: id.to_string(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FormError::UnknownForm(_) => 404,
            FormError::NotFound { .. } => 404,
            FormError::InvalidBody(_) => 400,
            FormError::UploadNotAccepted(_) => 400,
            FormError::Upload(e) => e.status_code(),
            FormError::Storage(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FormError::UnknownForm("x".into()).status_code(), 404);
        assert_eq!(FormError::not_found("quotation", "q1").status_code(), 404);
        assert_eq!(FormError::InvalidBody("array".into()).status_code(), 400);
        assert_eq!(
            FormError::from(UploadError::FileTooLarge(10, 5)).status_code(),
            413
        );
        assert_eq!(
            FormError::from(StorageError::data_corruption("crc")).status_code(),
            500
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = FormError::not_found("qhse-audit", "abc");
        assert_eq!(err.to_string(), "Record not found: qhse-audit/abc");
    }
}
