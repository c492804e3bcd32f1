//! Unwrapping of the remote's response envelopes.
//!
//! List endpoints answer either `{"<key>": [...]}` or the view wrapper
//! `{"viewContentsV1": {"<key>": [...]}}`. Detail endpoints answer either the object itself or a
//! one-element list under a key.

use crate::error::{CoverityError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

const VIEW_WRAPPER: &str = "viewContentsV1";

/// Extract and decode the list stored under `key`.
pub(crate) fn list_under<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
    key: &str,
) -> Result<Vec<T>> {
    let items = match body {
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut obj) => match obj.remove(key) {
            Some(v) => v,
            None => match obj.remove(VIEW_WRAPPER) {
                Some(Value::Object(mut view)) => view
                    .remove(key)
                    .ok_or_else(|| malformed(endpoint, &format!("'{VIEW_WRAPPER}' has no '{key}'")))?,
                _ => return Err(malformed(endpoint, &format!("missing '{key}' list"))),
            },
        },
        _ => return Err(malformed(endpoint, "expected a JSON object")),
    };

    match items {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(items)
            .map_err(|e| malformed(endpoint, &format!("cannot decode '{key}': {e}"))),
        _ => Err(malformed(endpoint, &format!("'{key}' is not a list"))),
    }
}

/// Extract a single record: the first element of `body[key]`, or the body itself when it is
/// a bare object without that key. Empty objects and empty lists are absent.
pub(crate) fn single<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
    key: &str,
) -> Result<Option<T>> {
    let record = match body {
        Value::Null => return Ok(None),
        Value::Object(mut obj) => match obj.remove(key) {
            Some(Value::Array(items)) => match items.into_iter().next() {
                Some(first) => first,
                None => return Ok(None),
            },
            Some(Value::Null) => return Ok(None),
            Some(other) => other,
            None if obj.is_empty() => return Ok(None),
            None => Value::Object(obj),
        },
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        },
        _ => return Err(malformed(endpoint, "expected a JSON object")),
    };

    serde_json::from_value(record)
        .map(Some)
        .map_err(|e| malformed(endpoint, &format!("cannot decode record: {e}")))
}

/// Like [`single`], but a record whose `id_field` is not `id` is absent. Routes such as
/// `issues/search` or `users/summary` share a path shape with detail lookups and must not be
/// mistaken for the requested entity.
pub(crate) fn single_identified<T: DeserializeOwned>(
    endpoint: &str,
    body: Value,
    key: &str,
    id_field: &str,
    id: &str,
) -> Result<Option<T>> {
    let Some(record) = single::<Value>(endpoint, body, key)? else {
        return Ok(None);
    };
    let found = match record.get(id_field) {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    };
    if !found {
        tracing::debug!(endpoint, id, "record does not match the requested id");
        return Ok(None);
    }
    serde_json::from_value(record)
        .map(Some)
        .map_err(|e| malformed(endpoint, &format!("cannot decode record: {e}")))
}

fn malformed(endpoint: &str, reason: &str) -> CoverityError {
    CoverityError::Malformed {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}
