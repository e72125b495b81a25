//! # Local Filesystem Backend

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use super::backend::UploadBackend;
use super::errors::{UploadError, UploadResult};

/// Uploads stored under a root directory on local disk
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path under the root; anything that could escape
    /// it (`..`, absolute paths, prefixes) is rejected.
    fn full_path(&self, path: &str) -> UploadResult<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(UploadError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn map_io(path: &str, e: io::Error) -> UploadError {
        if e.kind() == io::ErrorKind::NotFound {
            UploadError::NotFound(path.to_string())
        } else {
            UploadError::IoError(e.to_string())
        }
    }
}

impl UploadBackend for LocalBackend {
    fn write(&self, path: &str, data: &[u8]) -> UploadResult<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| UploadError::IoError(e.to_string()))?;
        }

        fs::write(&full_path, data).map_err(|e| UploadError::IoError(e.to_string()))
    }

    fn delete(&self, path: &str) -> UploadResult<()> {
        fs::remove_file(self.full_path(path)?).map_err(|e| Self::map_io(path, e))
    }
}
