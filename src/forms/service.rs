//! # Form Service
//!
//! Create, edit, read and delete form records of any registered type.
//!
//! Create: strip client-owned fields, attach the upload, count the existing
//! records of the type and label the new one `{count + 1}.0`.
//!
//! Edit: merge the partial update over the stored document and bump the
//! minor revision of the *stored* label, atomically per record. A revision
//! sent by the client is never used.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::errors::{FormError, FormResult};
use super::kind::FormKind;
use super::merge::{
    apply_partial_update, strip_managed_fields, CREATED_AT_KEY, ID_KEY, UPDATED_AT_KEY,
};
use crate::revision::{next_label_for_create, next_label_for_update_value, RevisionLabel};
use crate::storage::DocumentStore;
use crate::uploads::{LocalBackend, StoredUpload, Upload, UploadBackend, UploadService};

pub struct FormService<B: UploadBackend = LocalBackend> {
    store: Arc<dyn DocumentStore>,
    uploads: UploadService<B>,
    /// Serializes count + insert so two creates never share a major revision.
    create_lock: Mutex<()>,
}

impl<B: UploadBackend> FormService<B> {
    pub fn new(store: Arc<dyn DocumentStore>, uploads: UploadService<B>) -> Self {
        Self {
            store,
            uploads,
            create_lock: Mutex::new(()),
        }
    }

    pub fn uploads(&self) -> &UploadService<B> {
        &self.uploads
    }

    /// Create a record. Returns the stored document.
    pub fn create(
        &self,
        kind: FormKind,
        body: Value,
        upload: Option<Upload>,
    ) -> FormResult<Value> {
        let mut document = require_object(body)?;
        strip_managed_fields(&mut document);

        let stored_upload = self.attach_upload(kind, &mut document, upload.as_ref())?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let result = {
            let _guard = self
                .create_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            self.store.count(kind.collection()).and_then(|count| {
                let label = next_label_for_create(count);
                kind.revision_field().write(&mut document, &label);
                set(&mut document, ID_KEY, Value::String(id.clone()));
                set(&mut document, CREATED_AT_KEY, Value::String(now.clone()));
                set(&mut document, UPDATED_AT_KEY, Value::String(now));

                self.store
                    .insert(kind.collection(), &id, document.clone())
                    .map(|()| label)
            })
        };

        match result {
            Ok(label) => {
                tracing::info!(form = kind.slug(), %id, revision = %label, "form record created");
                Ok(document)
            }
            Err(e) => {
                tracing::error!(form = kind.slug(), error = %e, "form record create failed");
                self.discard_upload(stored_upload.as_ref());
                Err(e.into())
            }
        }
    }

    /// Apply a partial update to an existing record. Returns the stored document.
    pub fn update(
        &self,
        kind: FormKind,
        id: &str,
        patch: Value,
        upload: Option<Upload>,
    ) -> FormResult<Value> {
        let mut patch = require_object(patch)?;
        strip_managed_fields(&mut patch);

        // Fail before writing any file for a record that is not there.
        if self.store.get(kind.collection(), id)?.is_none() {
            return Err(FormError::not_found(kind.slug(), id));
        }

        let stored_upload = self.attach_upload(kind, &mut patch, upload.as_ref())?;

        let field = kind.revision_field();
        let mut assigned: Option<(RevisionLabel, bool)> = None;
        let now = Utc::now().to_rfc3339();

        let result = self
            .store
            .update_with(kind.collection(), id, &mut |current| {
                let previous = field.read(current);
                let label = next_label_for_update_value(previous);
                let well_formed = previous
                    .and_then(Value::as_str)
                    .map(|s| s.parse::<RevisionLabel>().is_ok())
                    .unwrap_or(false);

                let mut merged = apply_partial_update(current, &patch);
                field.write(&mut merged, &label);
                set(&mut merged, UPDATED_AT_KEY, Value::String(now.clone()));

                assigned = Some((label, well_formed));
                merged
            });

        match result {
            Ok(Some(document)) => {
                if let Some((label, well_formed)) = assigned {
                    if !well_formed {
                        tracing::warn!(
                            form = kind.slug(),
                            %id,
                            revision = %label,
                            "stored revision label was missing or malformed"
                        );
                    }
                    tracing::info!(form = kind.slug(), %id, revision = %label, "form record updated");
                }
                Ok(document)
            }
            Ok(None) => {
                self.discard_upload(stored_upload.as_ref());
                Err(FormError::not_found(kind.slug(), id))
            }
            Err(e) => {
                tracing::error!(form = kind.slug(), %id, error = %e, "form record update failed");
                self.discard_upload(stored_upload.as_ref());
                Err(e.into())
            }
        }
    }

    pub fn get(&self, kind: FormKind, id: &str) -> FormResult<Value> {
        self.store
            .get(kind.collection(), id)?
            .ok_or_else(|| FormError::not_found(kind.slug(), id))
    }

    /// All records of a type, in creation order (major revision, then
    /// creation time).
    pub fn list(&self, kind: FormKind) -> FormResult<Vec<Value>> {
        let field = kind.revision_field();
        let mut records = self.store.list(kind.collection())?;

        records.sort_by_cached_key(|doc| {
            let major = field
                .read(doc)
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<RevisionLabel>().ok())
                .map(|label| label.major())
                .unwrap_or(u64::MAX);
            let created = doc
                .get(CREATED_AT_KEY)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (major, created)
        });

        Ok(records)
    }

    pub fn delete(&self, kind: FormKind, id: &str) -> FormResult<()> {
        if self.store.delete(kind.collection(), id)? {
            tracing::info!(form = kind.slug(), %id, "form record deleted");
            Ok(())
        } else {
            Err(FormError::not_found(kind.slug(), id))
        }
    }

    /// The label the next create of `kind` would receive.
    pub fn next_create_label(&self, kind: FormKind) -> FormResult<RevisionLabel> {
        Ok(next_label_for_create(self.store.count(kind.collection())?))
    }

    fn attach_upload(
        &self,
        kind: FormKind,
        document: &mut Value,
        upload: Option<&Upload>,
    ) -> FormResult<Option<StoredUpload>> {
        let Some(upload) = upload else {
            return Ok(None);
        };
        let field = kind
            .upload_field()
            .ok_or_else(|| FormError::UploadNotAccepted(kind.slug().to_string()))?;

        let stored = self.uploads.store(kind.slug(), upload)?;
        set(document, field, Value::String(stored.public_path.clone()));
        Ok(Some(stored))
    }

    fn discard_upload(&self, stored: Option<&StoredUpload>) {
        if let Some(stored) = stored {
            if let Err(e) = self.uploads.discard(stored) {
                tracing::warn!(path = %stored.relative_path, error = %e, "failed to remove orphaned upload");
            }
        }
    }
}

fn require_object(body: Value) -> FormResult<Value> {
    match body {
        Value::Object(_) => Ok(body),
        other => Err(FormError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn set(document: &mut Value, key: &str, value: Value) {
    if let Some(root) = document.as_object_mut() {
        root.insert(key.to_string(), value);
    }
}
