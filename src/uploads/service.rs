//! # Upload Service
//!
//! Persists the optional file attached to a form submission and hands back
//! the public path the form document stores.

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::backend::UploadBackend;
use super::errors::{UploadError, UploadResult};

/// URL prefix uploaded files are served under
pub const UPLOADS_ROUTE: &str = "/uploads";

const MAX_NAME_LEN: usize = 100;

/// A file received with a form submission
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name as sent by the client; may contain a client-side path
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A persisted upload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredUpload {
    /// `/uploads/<directory>/<file>`
    pub public_path: String,
    /// `<directory>/<file>`, relative to the backend root
    pub relative_path: String,
    pub size: u64,
    pub content_type: String,
    /// SHA-256, lowercase hex
    pub checksum: String,
}

#[derive(Debug)]
pub struct UploadService<B: UploadBackend> {
    backend: B,
    max_bytes: u64,
    unsafe_chars: Regex,
}

impl<B: UploadBackend> UploadService<B> {
    pub fn new(backend: B, max_bytes: u64) -> UploadResult<Self> {
        let unsafe_chars =
            Regex::new(r"[^A-Za-z0-9._-]+").map_err(|e| UploadError::Internal(e.to_string()))?;
        Ok(Self {
            backend,
            max_bytes,
            unsafe_chars,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Write `upload` under `directory` (a form slug).
    ///
    /// The stored name is `<unix-millis>-<8 hex>-<sanitized original>` so two
    /// uploads of the same file never collide.
    pub fn store(&self, directory: &str, upload: &Upload) -> UploadResult<StoredUpload> {
        let size = upload.data.len() as u64;
        if size == 0 {
            return Err(UploadError::EmptyFile(upload.file_name.clone()));
        }
        if size > self.max_bytes {
            return Err(UploadError::FileTooLarge(size, self.max_bytes));
        }
        if directory.is_empty() || self.unsafe_chars.is_match(directory) || directory.starts_with('.')
        {
            return Err(UploadError::InvalidPath(directory.to_string()));
        }

        let unique = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &unique[..8],
            self.sanitize_file_name(&upload.file_name)
        );
        let relative_path = format!("{}/{}", directory, file_name);

        let checksum = checksum_hex(&upload.data);
        self.backend.write(&relative_path, &upload.data)?;

        tracing::debug!(
            path = %relative_path,
            size,
            content_type = %upload.content_type,
            sha256 = %checksum,
            "upload stored"
        );

        Ok(StoredUpload {
            public_path: format!("{}/{}", UPLOADS_ROUTE, relative_path),
            relative_path,
            size,
            content_type: upload.content_type.clone(),
            checksum,
        })
    }

    /// Remove a stored upload whose owning write failed.
    pub fn discard(&self, stored: &StoredUpload) -> UploadResult<()> {
        self.backend.delete(&stored.relative_path)
    }

    /// Keep the last path component of a client file name and reduce it to
    /// `[A-Za-z0-9._-]`.
    pub fn sanitize_file_name(&self, original: &str) -> String {
        let base = original
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or_default();
        let cleaned = self.unsafe_chars.replace_all(base, "_");
        let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

        if cleaned.is_empty() {
            return "file".to_string();
        }

        // Truncate on a char boundary; the cleaned name is ASCII.
        cleaned.chars().take(MAX_NAME_LEN).collect()
    }
}

fn checksum_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploads::LocalBackend;
    use tempfile::TempDir;

    fn service(temp: &TempDir, max: u64) -> UploadService<LocalBackend> {
        UploadService::new(LocalBackend::new(temp.path().to_path_buf()), max).unwrap()
    }

    fn upload(name: &str, data: &[u8]) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_store_under_form_directory() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp, 1024);

        let stored = svc
            .store("sts-checklist", &upload("Mooring Plan.pdf", b"%PDF-1.7"))
            .unwrap();

        assert!(stored.public_path.starts_with("/uploads/sts-checklist/"));
        assert!(stored.public_path.ends_with("-Mooring_Plan.pdf"));
        assert_eq!(stored.size, 8);
        assert_eq!(stored.checksum.len(), 64);

        let on_disk = temp.path().join(&stored.relative_path);
        assert_eq!(std::fs::read(on_disk).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_same_name_twice_does_not_collide() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp, 1024);

        let a = svc.store("quotation", &upload("q.pdf", b"a")).unwrap();
        let b = svc.store("quotation", &upload("q.pdf", b"b")).unwrap();
        assert_ne!(a.relative_path, b.relative_path);
    }

    #[test]
    fn test_limits() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp, 4);

        assert!(matches!(
            svc.store("quotation", &upload("big.bin", b"12345")),
            Err(UploadError::FileTooLarge(5, 4))
        ));
        assert!(matches!(
            svc.store("quotation", &upload("empty.bin", b"")),
            Err(UploadError::EmptyFile(_))
        ));
        assert!(matches!(
            svc.store("../etc", &upload("x", b"1")),
            Err(UploadError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp, 1);

        assert_eq!(svc.sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(svc.sanitize_file_name("C:\\Users\\mate\\log 1.xlsx"), "log_1.xlsx");
        assert_eq!(svc.sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(svc.sanitize_file_name(".."), "file");
        assert_eq!(svc.sanitize_file_name("überprüfung.pdf"), "berpr_fung.pdf");
        assert_eq!(svc.sanitize_file_name(""), "file");
        assert_eq!(svc.sanitize_file_name(&"a".repeat(300)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_discard() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp, 1024);

        let stored = svc.store("expense-sheet", &upload("r.png", b"png")).unwrap();
        svc.discard(&stored).unwrap();
        assert!(!temp.path().join(&stored.relative_path).exists());
    }
}
