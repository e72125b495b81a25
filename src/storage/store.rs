//! # Document Store
//!
//! Form documents are opaque JSON objects grouped by collection (one
//! collection per form type). `update_with` is the only edit primitive: it
//! runs read, modify and write under one lock, so two concurrent edits of a
//! record can never both read the same stored revision.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use super::errors::{StorageError, StorageResult};
use super::reader::StorageReader;
use super::record::FormRecord;
use super::writer::StorageWriter;

/// Backing store for form documents
pub trait DocumentStore: Send + Sync {
    /// Number of live documents in `collection`
    fn count(&self, collection: &str) -> StorageResult<u64>;

    /// Store `document` under `id`, replacing any previous document
    fn insert(&self, collection: &str, id: &str, document: Value) -> StorageResult<()>;

    fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Value>>;

    /// All live documents of `collection`, ordered by id
    fn list(&self, collection: &str) -> StorageResult<Vec<Value>>;

    /// Remove a document. Returns `false` if it did not exist.
    fn delete(&self, collection: &str, id: &str) -> StorageResult<bool>;

    /// Atomically replace a document with `apply(current)`.
    ///
    /// Returns the stored result, or `None` if the document does not exist
    /// (in which case `apply` is not called).
    fn update_with(
        &self,
        collection: &str,
        id: &str,
        apply: &mut dyn FnMut(&Value) -> Value,
    ) -> StorageResult<Option<Value>>;
}

/// Latest document per `collection -> id`
#[derive(Debug, Default)]
struct DocumentIndex {
    collections: HashMap<String, BTreeMap<String, Value>>,
}

impl DocumentIndex {
    fn count(&self, collection: &str) -> u64 {
        self.collections
            .get(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0)
    }

    fn get(&self, collection: &str, id: &str) -> Option<&Value> {
        self.collections.get(collection).and_then(|docs| docs.get(id))
    }

    fn list(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn put(&mut self, collection: &str, id: &str, document: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    fn remove(&mut self, collection: &str, id: &str) -> bool {
        self.collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ==================
// In-memory store
// ==================

/// Volatile store for tests and `serve --in-memory`
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: Mutex<DocumentIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn count(&self, collection: &str) -> StorageResult<u64> {
        Ok(lock(&self.index).count(collection))
    }

    fn insert(&self, collection: &str, id: &str, document: Value) -> StorageResult<()> {
        lock(&self.index).put(collection, id, document);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Value>> {
        Ok(lock(&self.index).get(collection, id).cloned())
    }

    fn list(&self, collection: &str) -> StorageResult<Vec<Value>> {
        Ok(lock(&self.index).list(collection))
    }

    fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        Ok(lock(&self.index).remove(collection, id))
    }

    fn update_with(
        &self,
        collection: &str,
        id: &str,
        apply: &mut dyn FnMut(&Value) -> Value,
    ) -> StorageResult<Option<Value>> {
        let mut index = lock(&self.index);
        let updated = match index.get(collection, id) {
            Some(current) => apply(current),
            None => return Ok(None),
        };
        index.put(collection, id, updated.clone());
        Ok(Some(updated))
    }
}

// ==================
// File-backed store
// ==================

struct FileStoreInner {
    writer: StorageWriter,
    index: DocumentIndex,
}

/// Durable store: append-only record file plus an in-memory index of the
/// latest document per id, rebuilt by replay on open.
pub struct FileStore {
    inner: Mutex<FileStoreInner>,
}

impl FileStore {
    /// Open `<data_dir>/data/forms.dat`, replaying it into memory.
    ///
    /// Any corrupt record fails the open.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let writer = StorageWriter::open(data_dir)?;

        let mut index = DocumentIndex::default();
        let mut reader = StorageReader::open(writer.path())?;
        for record in reader.build_document_map()?.into_values() {
            let document = record.to_value()?;
            index.put(&record.collection, &record.document_id, document);
        }

        tracing::info!(
            path = %writer.path().display(),
            collections = index.collections.len(),
            "form store opened"
        );

        Ok(Self {
            inner: Mutex::new(FileStoreInner { writer, index }),
        })
    }

    fn ensure_object(collection: &str, id: &str, document: &Value) -> StorageResult<()> {
        if document.is_object() {
            Ok(())
        } else {
            Err(StorageError::invalid_document(
                &format!("{}:{}", collection, id),
                "document must be a JSON object",
            ))
        }
    }
}

impl DocumentStore for FileStore {
    fn count(&self, collection: &str) -> StorageResult<u64> {
        Ok(lock(&self.inner).index.count(collection))
    }

    fn insert(&self, collection: &str, id: &str, document: Value) -> StorageResult<()> {
        Self::ensure_object(collection, id, &document)?;
        let record = FormRecord::document(collection, id, &document)?;

        let mut inner = lock(&self.inner);
        inner.writer.append(&record)?;
        inner.index.put(collection, id, document);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Value>> {
        Ok(lock(&self.inner).index.get(collection, id).cloned())
    }

    fn list(&self, collection: &str) -> StorageResult<Vec<Value>> {
        Ok(lock(&self.inner).index.list(collection))
    }

    fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        let mut inner = lock(&self.inner);
        if inner.index.get(collection, id).is_none() {
            return Ok(false);
        }
        inner
            .writer
            .append(&FormRecord::tombstone(collection, id))?;
        Ok(inner.index.remove(collection, id))
    }

    fn update_with(
        &self,
        collection: &str,
        id: &str,
        apply: &mut dyn FnMut(&Value) -> Value,
    ) -> StorageResult<Option<Value>> {
        let mut inner = lock(&self.inner);
        let updated = match inner.index.get(collection, id) {
            Some(current) => apply(current),
            None => return Ok(None),
        };
        Self::ensure_object(collection, id, &updated)?;

        let record = FormRecord::document(collection, id, &updated)?;
        inner.writer.append(&record)?;
        inner.index.put(collection, id, updated.clone());
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn exercise(store: &dyn DocumentStore) {
        assert_eq!(store.count("vendor_approvals").unwrap(), 0);

        store
            .insert("vendor_approvals", "v1", json!({"vendor": "Acme Marine"}))
            .unwrap();
        store
            .insert("vendor_approvals", "v2", json!({"vendor": "Baltic Supply"}))
            .unwrap();
        store.insert("quotations", "q1", json!({"total": 10})).unwrap();

        assert_eq!(store.count("vendor_approvals").unwrap(), 2);
        assert_eq!(store.count("quotations").unwrap(), 1);
        assert_eq!(store.list("vendor_approvals").unwrap().len(), 2);

        let updated = store
            .update_with("vendor_approvals", "v1", &mut |current| {
                let mut next = current.clone();
                next["approved"] = json!(true);
                next
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated["vendor"], "Acme Marine");
        assert_eq!(updated["approved"], true);

        let mut called = false;
        let missing = store
            .update_with("vendor_approvals", "nope", &mut |v| {
                called = true;
                v.clone()
            })
            .unwrap();
        assert!(missing.is_none());
        assert!(!called);

        assert!(store.delete("vendor_approvals", "v2").unwrap());
        assert!(!store.delete("vendor_approvals", "v2").unwrap());
        assert_eq!(store.count("vendor_approvals").unwrap(), 1);
        assert!(store.get("vendor_approvals", "v2").unwrap().is_none());
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn test_file_store() {
        let temp_dir = TempDir::new().unwrap();
        exercise(&FileStore::open(temp_dir.path()).unwrap());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileStore::open(temp_dir.path()).unwrap();
            exercise(&store);
        }

        let store = FileStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.count("vendor_approvals").unwrap(), 1);
        assert_eq!(store.count("quotations").unwrap(), 1);
        let v1 = store.get("vendor_approvals", "v1").unwrap().unwrap();
        assert_eq!(v1["approved"], true);
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();

        let err = store.insert("quotations", "q1", json!([1, 2])).unwrap_err();
        assert_eq!(err.code().code(), "STORE_INVALID_DOCUMENT");
    }

    #[test]
    fn test_file_store_open_fails_on_corruption() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(temp_dir.path()).unwrap();
            store.insert("quotations", "q1", json!({"total": 1})).unwrap();
        }

        let path = temp_dir.path().join("data").join("forms.dat");
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let err = FileStore::open(temp_dir.path()).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_update_with_serializes_concurrent_edits() {
        let store = Arc::new(MemoryStore::new());
        store.insert("logs", "l1", json!({"edits": 0})).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        store
                            .update_with("logs", "l1", &mut |current| {
                                let edits = current["edits"].as_u64().unwrap_or(0);
                                json!({ "edits": edits + 1 })
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let doc = store.get("logs", "l1").unwrap().unwrap();
        assert_eq!(doc["edits"], 400);
    }
}
