//! # Form Uploads
//!
//! Optional file attachments for form submissions. Files are written under
//! `<upload_dir>/<form-slug>/` and served back at `/uploads/<form-slug>/...`.

pub mod backend;
pub mod errors;
pub mod local;
pub mod service;

pub use backend::UploadBackend;
pub use errors::{UploadError, UploadResult};
pub use local::LocalBackend;
pub use service::{StoredUpload, Upload, UploadService, UPLOADS_ROUTE};
