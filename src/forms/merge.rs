//! Default-merging of partial form updates

use serde_json::Value;

use super::kind::RevisionField;

/// Fields the service owns; client values for them are discarded.
pub const ID_KEY: &str = "_id";
pub const CREATED_AT_KEY: &str = "createdAt";
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Merge `patch` over `existing`.
///
/// - keys missing from the patch keep their existing value
/// - `null` or `""` in the patch keeps the existing value
/// - objects on both sides merge recursively
/// - anything else in the patch replaces
///
/// A non-object patch leaves `existing` unchanged.
pub fn apply_partial_update(existing: &Value, patch: &Value) -> Value {
    let (Some(base), Some(patch)) = (existing.as_object(), patch.as_object()) else {
        return existing.clone();
    };

    let mut merged = base.clone();
    for (key, incoming) in patch {
        if is_blank(incoming) {
            continue;
        }
        let next = match (merged.get(key), incoming) {
            (Some(current), Value::Object(_)) if current.is_object() => {
                apply_partial_update(current, incoming)
            }
            _ => incoming.clone(),
        };
        merged.insert(key.clone(), next);
    }

    Value::Object(merged)
}

/// Remove client-supplied values for service-owned fields.
///
/// A revision label is dropped from both locations whichever one the form
/// type uses.
pub fn strip_managed_fields(document: &mut Value) {
    if let Some(root) = document.as_object_mut() {
        root.remove(ID_KEY);
        root.remove(CREATED_AT_KEY);
        root.remove(UPDATED_AT_KEY);
    }
    RevisionField::TopLevel.remove(document);
    RevisionField::DocumentInfo.remove(document);
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
