//! Parameter Accessor
//!
//! Typed lookups into untyped parameter bags. Values are never coerced: a
//! number where a string is expected is a [`TypeMismatch`], not a string.
//! JSON `null` is treated the same as an absent key.
//!
//! [`TypeMismatch`]: ExternalNameError::TypeMismatch

use super::error::{ExternalNameError, Result};
use serde_json::{Map, Value};

/// Desired parameters or observed remote state of a single resource
pub type ParameterBag = Map<String, Value>;

/// Get a field, failing with `MissingField` when it is absent or null
pub fn get<'a>(bag: &'a ParameterBag, key: &str) -> Result<&'a Value> {
    match bag.get(key) {
        Some(Value::Null) | None => Err(ExternalNameError::missing(key)),
        Some(v) => Ok(v),
    }
}

/// Get a string field
pub fn get_string<'a>(bag: &'a ParameterBag, key: &str) -> Result<&'a str> {
    get(bag, key)?
        .as_str()
        .ok_or_else(|| ExternalNameError::type_mismatch(key, "a string"))
}

/// Get a string field that may be absent
pub fn get_optional_string<'a>(bag: &'a ParameterBag, key: &str) -> Result<Option<&'a str>> {
    match bag.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ExternalNameError::type_mismatch(key, "a string")),
    }
}

/// Get a list of strings; every element must be a string
pub fn get_string_list<'a>(bag: &'a ParameterBag, key: &str) -> Result<Vec<&'a str>> {
    let Value::Array(items) = get(bag, key)? else {
        return Err(ExternalNameError::type_mismatch(key, "a list of strings"));
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| ExternalNameError::type_mismatch(key, "a list of strings"))
        })
        .collect()
}

/// Walk a nested path through mappings and sequences.
///
/// Numeric segments index into sequences. A missing step fails with
/// `MissingField` naming the full dotted path.
pub fn get_path<'a, S: AsRef<str>>(bag: &'a ParameterBag, path: &[S]) -> Result<&'a Value> {
    let dotted = || {
        path.iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(".")
    };

    let Some((first, rest)) = path.split_first() else {
        return Err(ExternalNameError::missing(""));
    };

    let mut current = bag.get(first.as_ref()).ok_or_else(|| ExternalNameError::missing(dotted()))?;

    for part in rest {
        let part = part.as_ref();
        let next = match current {
            Value::Object(map) => map.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        };
        current = next.ok_or_else(|| ExternalNameError::missing(dotted()))?;
    }

    if current.is_null() {
        return Err(ExternalNameError::missing(dotted()));
    }

    Ok(current)
}
