//! # Upload Backend Trait

use super::errors::UploadResult;

/// Where uploaded bytes end up. Paths are relative, `/`-separated.
pub trait UploadBackend: Send + Sync + std::fmt::Debug {
    fn write(&self, path: &str, data: &[u8]) -> UploadResult<()>;

    fn delete(&self, path: &str) -> UploadResult<()>;
}
