//! Defensive field coercion.
//!
//! The store may hand back either a string or a number for any cell, so
//! readers never pattern-match on one JSON type. Timestamps arrive as
//! unix seconds (integer or float) or as RFC 3339 strings.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::store::FieldMap;

/// Read a field as text. Numbers are rendered to their decimal form.
pub fn text(fields: &FieldMap, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a field as an integer. Floats are truncated; numeric strings are
/// parsed.
pub fn integer(fields: &FieldMap, name: &str) -> Option<i64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Read a field as a float, coercing numeric strings.
pub fn float(fields: &FieldMap, name: &str) -> Option<f64> {
    match fields.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read a field as a UTC timestamp.
///
/// Accepts unix seconds (integer or float) or an RFC 3339 string.
/// Anything else reads as `None`; callers decide whether that skips the
/// row or fails the operation.
pub fn timestamp(fields: &FieldMap, name: &str) -> Option<DateTime<Utc>> {
    match fields.get(name)? {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_opt(secs, 0).single()
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
                return Some(parsed.with_timezone(&Utc));
            }
            let secs = trimmed.parse::<i64>().ok()?;
            Utc.timestamp_opt(secs, 0).single()
        }
        _ => None,
    }
}

/// Encode a timestamp for writing: unix seconds.
pub fn encode_timestamp(at: DateTime<Utc>) -> Value {
    Value::from(at.timestamp())
}
