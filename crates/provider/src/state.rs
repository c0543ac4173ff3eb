//! Record helpers
//!
//! Reading API bodies into records and comparing desired values against what
//! the server reports.

use serde_json::Value;

use cloudscale_common::Record;

/// Interpret a response body as a single record
pub fn into_record(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Interpret a listing body as records. Non-object entries are skipped.
pub fn into_records(value: Option<Value>) -> Vec<Record> {
    match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(into_record).collect(),
        _ => Vec::new(),
    }
}

/// Get a string attribute from a record
pub fn str_attr<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Look up a field, optionally one level below `parent`
pub fn lookup<'a>(record: &'a Record, parent: Option<&str>, key: &str) -> Option<&'a Value> {
    match parent {
        Some(parent) => record.get(parent)?.as_object()?.get(key),
        None => record.get(key),
    }
}

/// Identity of a referenced resource.
///
/// A plain string is taken as-is. A stub object yields its `uuid`, falling
/// back to the last segment of its `href`.
pub fn stub_id(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(stub) => stub
            .get("uuid")
            .and_then(Value::as_str)
            .or_else(|| {
                stub.get("href")
                    .and_then(Value::as_str)
                    .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
            }),
        _ => None,
    }
}

/// Whether `desired` differs from the `current` server value.
///
/// The server reports references as stub objects while callers pass a plain
/// identifier. Stubs with a `slug` (flavors, zones) compare by slug, all
/// others by UUID.
pub fn differs(current: &Value, desired: &Value) -> bool {
    if let (Value::Object(stub), Value::String(want)) = (current, desired) {
        if let Some(slug) = stub.get("slug").and_then(Value::as_str) {
            return slug != want;
        }
        if let Some(id) = stub_id(current) {
            return id != want;
        }
    }
    current != desired
}
