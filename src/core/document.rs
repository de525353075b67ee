//! Documents and the fields stores manage on them.

use crate::core::value::Value;
use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A schema-less record: field name to value.
pub type Document = BTreeMap<String, Value>;

/// Unique identifier field, assigned at insert.
pub const ID_FIELD: &str = "id";

/// Creation timestamp field, set once at insert.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Modification timestamp field, refreshed on every update.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Stamps a document about to be inserted.
///
/// Any caller-provided `id`, `createdAt` or `updatedAt` is overwritten.
pub fn stamp_insert(document: &mut Document, now: DateTime<Utc>) {
    document.insert(
        ID_FIELD.to_string(),
        Value::String(uuid::Uuid::new_v4().to_string()),
    );
    document.insert(CREATED_AT_FIELD.to_string(), Value::Instant(now));
    document.insert(UPDATED_AT_FIELD.to_string(), Value::Instant(now));
}

/// Stamps an update patch.
///
/// `id` and `createdAt` are immutable once a document is stored, so they are
/// dropped from the patch.
pub fn stamp_update(patch: &mut Document, now: DateTime<Utc>) {
    patch.remove(ID_FIELD);
    patch.remove(CREATED_AT_FIELD);
    patch.insert(UPDATED_AT_FIELD.to_string(), Value::Instant(now));
}

/// Parses a JSON object into a document.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or not an object.
pub fn parse_document(text: &str) -> Result<Document> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(StorageError::from)?;
    match Value::from(json) {
        Value::Map(map) => Ok(map),
        other => Err(StorageError::Serialization(format!(
            "expected a JSON object, got {}",
            other.to_json()
        ))
        .into()),
    }
}

/// Builds a document from `(field, value)` pairs.
pub fn document<K, V, I>(fields: I) -> Document
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
