//! Typed dotted-path resolution over JSON payloads.
//!
//! The gateway names the fields that participate in a webhook checksum as
//! dotted paths (`transaction.id`, `transaction.amount_in_cents`). A path that
//! does not resolve is an explicit [`PathError`], never an empty string.

use serde_json::Value;
use thiserror::Error;

/// Failure to resolve a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty property path")]
    EmptyPath,

    #[error("property '{0}' is missing from the payload")]
    Missing(String),

    #[error("property '{0}' is not a scalar value")]
    NotScalar(String),
}

/// Walks `root` along `path`, descending into objects by key and arrays by
/// numeric index. JSON `null` counts as missing.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    if path.trim().is_empty() {
        return Err(PathError::EmptyPath);
    }

    let mut current = root;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = match next {
            Some(Value::Null) | None => return Err(PathError::Missing(path.to_string())),
            Some(value) => value,
        };
    }
    Ok(current)
}

/// Resolves `path` and renders the value the way the gateway concatenates it:
/// strings verbatim, numbers and booleans in their JSON text form.
pub fn resolve_scalar(root: &Value, path: &str) -> Result<String, PathError> {
    match resolve_path(root, path)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(PathError::NotScalar(path.to_string())),
    }
}
