//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::{Document, Paginated, Value};
use crate::error::Error;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a single document, or its absence.
#[must_use]
pub fn format_document(document: Option<&Document>, format: OutputFormat) -> String {
    match (format, document) {
        (OutputFormat::Json, doc) => format_json(&doc),
        (OutputFormat::Text, None) => "No document found.\n".to_string(),
        (OutputFormat::Text, Some(doc)) => format_document_text(doc),
    }
}

fn format_document_text(document: &Document) -> String {
    let width = document.keys().map(String::len).max().unwrap_or(0);
    let mut output = String::new();
    for (field, value) in document {
        let _ = writeln!(output, "  {field:<width$}  {}", format_value(value));
    }
    output
}

/// Formats a list of documents.
#[must_use]
pub fn format_documents(documents: &[Document], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&documents),
        OutputFormat::Text => format_documents_text(documents),
    }
}

fn format_documents_text(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No documents found.\n".to_string();
    }

    let mut output = String::new();
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let id = document
            .get(crate::core::ID_FIELD)
            .map_or_else(|| "-".to_string(), format_value);
        let _ = writeln!(output, "[{}] {id}", i + 1);
        output.push_str(&format_document_text(document));
    }
    output
}

/// Formats a page with its metadata.
#[must_use]
pub fn format_paginated(page: &Paginated, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(page),
        OutputFormat::Text => {
            let mut output = format_documents_text(&page.data);
            let _ = writeln!(
                output,
                "\nPage {} (limit {}): {} of {} total",
                page.pagination.page,
                page.pagination.limit,
                page.data.len(),
                page.pagination.total
            );
            output
        }
    }
}

/// Formats a count.
#[must_use]
pub fn format_count(count: u64, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&serde_json::json!({ "count": count })),
        OutputFormat::Text => format!("{count}\n"),
    }
}

/// Formats the outcome of a write.
#[must_use]
pub fn format_affected(action: &str, rows: Option<usize>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&serde_json::json!({
            "action": action,
            "rows": rows,
        })),
        OutputFormat::Text => rows.map_or_else(
            || format!("{action} done.\n"),
            |n| format!("{action}: {n} row(s) affected.\n"),
        ),
    }
}

/// Formats a plain string result such as a translation or locale.
#[must_use]
pub fn format_text(key: &str, text: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let mut map = serde_json::Map::new();
            map.insert(key.to_string(), serde_json::Value::String(text.to_string()));
            format_json(&map)
        }
        OutputFormat::Text => format!("{text}\n"),
    }
}

/// Formats an error for the selected output.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&serde_json::json!({ "error": error.to_string() })),
        OutputFormat::Text => error.to_string(),
    }
}

/// Renders a value on one line; strings print unquoted.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}

fn format_json<T: Serialize>(value: &T) -> String {
    let mut json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    json.push('\n');
    json
}
