//! Sensitive-field redaction for audit output.
//!
//! A key is sensitive when its lowercase form contains any of the
//! [`SENSITIVE_PATTERNS`]. Sensitive values are replaced wholesale with
//! [`REDACTION_MASK`]; nested objects recurse, and list elements are checked
//! against the key that owns the list.

use serde_json::Value;

use crate::Args;

/// Replacement written in place of a sensitive value.
pub const REDACTION_MASK: &str = "***";

/// Lowercase substrings that mark a key as sensitive.
pub const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "secret",
    "token",
    "key",
    "credential",
    "api_key",
    "apikey",
    "access_token",
    "private_key",
];

/// Returns true when `key` matches a sensitive pattern, ignoring case.
#[must_use]
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Returns a redacted copy of `args`. Applying it twice changes nothing.
#[must_use]
pub fn redact_args(args: &Args) -> Args {
    args.iter()
        .map(|(key, value)| (key.clone(), redact_value(key, value)))
        .collect()
}

fn redact_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTION_MASK.to_string());
    }
    match value {
        Value::Object(map) => Value::Object(redact_args(map)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_value(key, v)).collect()),
        other => other.clone(),
    }
}
