//! Value codecs between documents and `SQLite` columns.
//!
//! `SQLite` only stores NULL, INTEGER, REAL, TEXT and BLOB. Outbound values
//! are normalized onto those types; inbound TEXT is denormalized by trying, in
//! order, the instant pattern, a JSON parse, and finally the raw string.

use crate::core::{Document, Value, format_instant};
use chrono::{DateTime, Utc};
use regex::Regex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use std::sync::OnceLock;

/// Exact shape of a normalized instant: `YYYY-MM-DDTHH:MM:SS.mmmZ`.
const INSTANT_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$";

#[allow(clippy::expect_used)]
fn instant_regex() -> &'static Regex {
    static INSTANT: OnceLock<Regex> = OnceLock::new();
    INSTANT.get_or_init(|| Regex::new(INSTANT_PATTERN).expect("valid regex"))
}

/// Normalizes a document value for binding as a statement parameter.
///
/// Booleans are written as the text `true`/`false`; the engine has no boolean
/// type and the text form comes back through the JSON step of
/// [`denormalize`].
#[must_use]
pub fn normalize(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Text(b.to_string()),
        Value::Integer(n) => SqlValue::Integer(*n),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Instant(dt) => SqlValue::Text(format_instant(dt)),
        Value::List(_) | Value::Map(_) => SqlValue::Text(value.to_json().to_string()),
    }
}

/// Denormalizes a column value read from a row.
#[must_use]
pub fn denormalize(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => denormalize_text(&String::from_utf8_lossy(bytes)),
        ValueRef::Blob(bytes) => {
            Value::List(bytes.iter().map(|b| Value::Integer(i64::from(*b))).collect())
        }
    }
}

/// Denormalizes a TEXT column.
///
/// A string that is neither an instant nor JSON is returned unchanged.
#[must_use]
pub fn denormalize_text(text: &str) -> Value {
    if let Some(dt) = parse_instant(text) {
        return Value::Instant(dt);
    }

    serde_json::from_str::<serde_json::Value>(text)
        .map_or_else(|_| Value::String(text.to_string()), Value::from)
}

/// Parses text in the normalized instant format.
///
/// Returns `None` for anything that does not match the exact pattern or is
/// not a real calendar time.
#[must_use]
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if !instant_regex().is_match(text) {
        return None;
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Denormalizes every column of a row into a document.
pub fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let stmt: &rusqlite::Statement<'_> = row.as_ref();
    let mut document = Document::new();
    for (index, name) in stmt.column_names().into_iter().enumerate() {
        document.insert(name.to_string(), denormalize(row.get_ref(index)?));
    }
    Ok(document)
}
