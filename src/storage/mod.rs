//! Form document storage
//!
//! An append-only record file holds every version of every form document.
//!
//! - Checksum (CRC32) on every record, verified on every read
//! - Corruption halts the open; it is never skipped
//! - Latest record wins for the same `collection:id`
//! - Deletes append a tombstone
//!
//! `DocumentStore` is the seam the form service talks to; `FileStore` is the
//! durable implementation and `MemoryStore` the volatile one.

mod errors;
mod reader;
mod record;
mod store;
mod writer;

pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::StorageReader;
pub use record::{compute_checksum, FormRecord};
pub use store::{DocumentStore, FileStore, MemoryStore};
pub use writer::{StorageWriter, STORE_FILE_NAME};
