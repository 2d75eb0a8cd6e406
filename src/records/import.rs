//! Normalization of externally supplied record files
//!
//! Accepted shapes are a bare JSON array of record-like objects or an object wrapping a
//! `records` array. Missing fields become the sentinel and a missing or unreadable timestamp
//! becomes the import time. Duplicate filtering happens later, against the store.

use crate::records::{Record, NOT_FOUND};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while reading an import file
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected an array of records or an object with a 'records' array")]
    UnexpectedShape,
}

/// Records read from an import file
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch {
    pub records: Vec<Record>,
    /// Entries that were not objects or had neither a name nor a URL
    pub rejected: usize,
}

/// Parses and normalizes an import file's content
pub fn parse_import(content: &str) -> Result<ImportBatch, ImportError> {
    let value: Value = serde_json::from_str(content)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("records") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(ImportError::UnexpectedShape),
        },
        _ => return Err(ImportError::UnexpectedShape),
    };

    let now = Utc::now();
    let mut records = Vec::with_capacity(entries.len());
    let mut rejected = 0;

    for entry in entries {
        match entry {
            Value::Object(object) => match normalize_entry(&object, now) {
                Some(record) => records.push(record),
                None => rejected += 1,
            },
            _ => rejected += 1,
        }
    }

    Ok(ImportBatch { records, rejected })
}

fn normalize_entry(object: &Map<String, Value>, now: DateTime<Utc>) -> Option<Record> {
    let record = Record {
        name: text_field(object, "name"),
        website: text_field(object, "website"),
        industry: text_field(object, "industry"),
        phone: text_field(object, "phone"),
        headquarters: text_field(object, "headquarters"),
        url: text_field(object, "url"),
        timestamp: object
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(now),
    };

    if record.name == NOT_FOUND && record.url == NOT_FOUND {
        return None;
    }
    Some(record)
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    let text = match object.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    if text.is_empty() {
        NOT_FOUND.to_string()
    } else {
        text
    }
}
