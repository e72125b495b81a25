//! Form store errors
//!
//! Every error carries a stable code and a severity. Corruption is the only
//! fatal class: a store that fails checksum verification must not serve.

use std::fmt;
use std::io;

/// Severity of a store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request fails, server keeps serving
    Error,
    /// Store can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    IoError,
    WriteFailed,
    ReadFailed,
    DataCorruption,
    InvalidDocument,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::IoError => "STORE_IO_ERROR",
            StorageErrorCode::WriteFailed => "STORE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "STORE_READ_FAILED",
            StorageErrorCode::DataCorruption => "STORE_DATA_CORRUPTION",
            StorageErrorCode::InvalidDocument => "STORE_INVALID_DOCUMENT",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with code, message and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::WriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::ReadFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Corruption found while scanning, with the byte offset of the bad record
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// A stored body that is not a JSON object, or a body that cannot be encoded
    pub fn invalid_document(document_key: &str, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::InvalidDocument,
            message: reason.into(),
            details: Some(format!("document: {}", document_key)),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(StorageErrorCode::IoError.code(), "STORE_IO_ERROR");
        assert_eq!(StorageErrorCode::WriteFailed.code(), "STORE_WRITE_FAILED");
        assert_eq!(StorageErrorCode::ReadFailed.code(), "STORE_READ_FAILED");
        assert_eq!(
            StorageErrorCode::DataCorruption.code(),
            "STORE_DATA_CORRUPTION"
        );
        assert_eq!(
            StorageErrorCode::InvalidDocument.code(),
            "STORE_INVALID_DOCUMENT"
        );
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StorageError::data_corruption("bad crc").is_fatal());
        assert!(!StorageError::invalid_document("x:y", "not an object").is_fatal());
        let io = io::Error::new(io::ErrorKind::Other, "disk");
        assert!(!StorageError::write_failed("append", io).is_fatal());
    }

    #[test]
    fn test_display_includes_details() {
        let err = StorageError::corruption_at_offset(42, "Checksum mismatch");
        let text = err.to_string();
        assert!(text.contains("[FATAL]"));
        assert!(text.contains("STORE_DATA_CORRUPTION"));
        assert!(text.contains("byte_offset: 42"));
    }

    #[test]
    fn test_source_preserved() {
        use std::error::Error;

        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::read_failed("open", io);
        assert!(err.source().is_some());
        assert_eq!(err.message(), "open");
    }
}
