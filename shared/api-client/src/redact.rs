//! Structural redaction of sensitive fields before logging.
//!
//! Operates on copied [`serde_json::Value`]s, never on the original, and is
//! idempotent: sanitizing an already-sanitized value changes nothing.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Replacement written over sensitive values.
pub const REDACTED: &str = "[REDACTED]";

/// Field names whose values are never logged, compared case-insensitively.
const SENSITIVE_FIELDS: &[&str] = &[
    "apikey",
    "api_key",
    "password",
    "token",
    "secret",
    "authorization",
];

pub(crate) fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_FIELDS.contains(&key.as_str())
}

/// Produce a copy of `value` with sensitive fields redacted.
///
/// Redaction applies to the top-level object and one nested object level;
/// deeper structure is copied verbatim.
#[must_use]
pub fn sanitize(value: &Value) -> Value {
    sanitize_object(value, 0)
}

fn sanitize_object(value: &Value, depth: u8) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };

    let mut out = Map::with_capacity(map.len());
    for (key, val) in map {
        if is_sensitive(key) {
            out.insert(key.clone(), Value::String(REDACTED.to_string()));
        } else if depth == 0 {
            out.insert(key.clone(), sanitize_object(val, 1));
        } else {
            out.insert(key.clone(), val.clone());
        }
    }
    Value::Object(out)
}

/// Redact sensitive header values for logging.
#[must_use]
pub fn sanitize_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive(key) {
                REDACTED.to_string()
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}
