//! Append-only writer for the form store file
//!
//! Every append is followed by fsync. There are no in-place updates: an
//! edit appends the full new document and the latest record wins.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::FormRecord;

/// Store file name under `<data_dir>/data/`
pub const STORE_FILE_NAME: &str = "forms.dat";

pub struct StorageWriter {
    storage_path: PathBuf,
    file: File,
    current_offset: u64,
}

impl StorageWriter {
    /// Open or create `<data_dir>/data/forms.dat`, creating directories as needed.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let data_subdir = data_dir.join("data");
        let storage_path = data_subdir.join(STORE_FILE_NAME);

        fs::create_dir_all(&data_subdir).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to create data directory: {}", data_subdir.display()),
                e,
            )
        })?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&storage_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open store file: {}", storage_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path,
            file,
            current_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Append a record and fsync. Returns the offset it was written at.
    ///
    /// A failed append is cut back off the file, so the file always ends on
    /// a record boundary.
    pub fn append(&mut self, record: &FormRecord) -> StorageResult<u64> {
        let serialized = record.serialize();
        let offset = self.current_offset;

        self.discard_torn_tail()?;

        if let Err(e) = self.file.write_all(&serialized) {
            self.truncate_to(offset);
            return Err(StorageError::write_failed(
                format!("Failed to append record: {}", record.key()),
                e,
            ));
        }

        if let Err(e) = self.file.sync_all() {
            self.truncate_to(offset);
            return Err(StorageError::write_failed(
                format!("fsync failed after appending record: {}", record.key()),
                e,
            ));
        }

        self.current_offset += serialized.len() as u64;

        Ok(offset)
    }

    /// Drop bytes past the last complete record, left by an append whose
    /// rollback did not go through.
    fn discard_torn_tail(&mut self) -> StorageResult<()> {
        let len = self
            .file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        if len != self.current_offset {
            tracing::warn!(
                path = %self.storage_path.display(),
                file_len = len,
                record_end = self.current_offset,
                "discarding partial record at end of store file"
            );
            self.file.set_len(self.current_offset).map_err(|e| {
                StorageError::write_failed("Failed to truncate partial record", e)
            })?;
        }

        Ok(())
    }

    fn truncate_to(&mut self, offset: u64) {
        if let Err(e) = self.file.set_len(offset) {
            tracing::error!(
                path = %self.storage_path.display(),
                offset,
                error = %e,
                "failed to roll back partial append"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::reader::StorageReader;
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_writer_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let data_path = temp_dir.path().join("data");
        assert!(!data_path.exists());

        let _writer = StorageWriter::open(temp_dir.path()).unwrap();

        assert!(data_path.join(STORE_FILE_NAME).exists());
    }

    #[test]
    fn test_append_tracks_offsets() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();

        let record = FormRecord::document("quotations", "q1", &json!({"total": 1200})).unwrap();
        let first = writer.append(&record).unwrap();
        let second = writer.append(&record).unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, record.serialize().len() as u64);
        assert_eq!(writer.current_offset(), 2 * second);
    }

    #[test]
    fn test_reopen_appends_after_existing() {
        let temp_dir = TempDir::new().unwrap();
        let record = FormRecord::document("quotations", "q1", &json!({})).unwrap();

        {
            let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
            writer.append(&record).unwrap();
        }

        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        assert_eq!(writer.current_offset(), record.serialize().len() as u64);
        writer.append(&FormRecord::tombstone("quotations", "q1")).unwrap();

        let mut reader = StorageReader::open(writer.path()).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].is_tombstone);
    }

    #[test]
    fn test_partial_record_cut_before_next_append() {
        use std::fs::OpenOptions;

        let temp_dir = TempDir::new().unwrap();
        let mut writer = StorageWriter::open(temp_dir.path()).unwrap();
        let record = FormRecord::document("quotations", "q1", &json!({"total": 5})).unwrap();
        writer.append(&record).unwrap();

        // Half-written record behind the writer's back
        {
            let mut file = OpenOptions::new().append(true).open(writer.path()).unwrap();
            file.write_all(&[0x40, 0, 0, 0, 0x07]).unwrap();
        }

        let second = writer.append(&record).unwrap();
        assert_eq!(second, record.serialize().len() as u64);
        assert_eq!(
            fs::metadata(writer.path()).unwrap().len(),
            writer.current_offset()
        );

        let mut reader = StorageReader::open(writer.path()).unwrap();
        assert_eq!(reader.read_all().unwrap().len(), 2);
    }
}
