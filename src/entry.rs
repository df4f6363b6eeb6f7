//! Entry contract.
//!
//! Documents and entries are plain JSON values. Builders pull the fields they
//! need through these accessors so a missing or mistyped field becomes a
//! [`BuildError`] naming the field, at the moment the builder needs it.

use crate::error::BuildError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One configuration record within a domain document
pub type Entry = Value;

/// One parsed configuration document
pub type Document = Value;

pub const NODE_ID: &str = "nodeId";
pub const LINK_ID: &str = "linkId";

/// Field access that fails with [`BuildError::MissingField`] when absent or null
pub fn required<'a>(entry: &'a Entry, field: &str) -> Result<&'a Value, BuildError> {
    match entry.get(field) {
        Some(Value::Null) | None => Err(BuildError::missing(field)),
        Some(value) => Ok(value),
    }
}

/// Field access that treats null like absence
pub fn optional<'a>(entry: &'a Entry, field: &str) -> Option<&'a Value> {
    entry.get(field).filter(|value| !value.is_null())
}

pub fn required_str<'a>(entry: &'a Entry, field: &str) -> Result<&'a str, BuildError> {
    required(entry, field)?
        .as_str()
        .ok_or_else(|| BuildError::invalid(field, "expected a string"))
}

pub fn required_u32(entry: &Entry, field: &str) -> Result<u32, BuildError> {
    let value = required(entry, field)?;
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| BuildError::invalid(field, format!("expected an unsigned 32-bit integer, got {}", value)))
}

pub fn required_bool(entry: &Entry, field: &str) -> Result<bool, BuildError> {
    required(entry, field)?
        .as_bool()
        .ok_or_else(|| BuildError::invalid(field, "expected a boolean"))
}

pub fn required_array<'a>(entry: &'a Entry, field: &str) -> Result<&'a [Value], BuildError> {
    required(entry, field)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| BuildError::invalid(field, "expected a list"))
}

/// Deserialize a required field into a typed structure
pub fn parse_required<T: DeserializeOwned>(entry: &Entry, field: &str) -> Result<T, BuildError> {
    let value = required(entry, field)?;
    serde_json::from_value(value.clone()).map_err(|e| BuildError::invalid(field, e))
}

/// Deserialize an optional field into a typed structure
pub fn parse_optional<T: DeserializeOwned>(entry: &Entry, field: &str) -> Result<Option<T>, BuildError> {
    optional(entry, field)
        .map(|value| serde_json::from_value(value.clone()).map_err(|e| BuildError::invalid(field, e)))
        .transpose()
}

/// Deserialize a whole entry; `what` names it in the error
pub fn parse_entry<T: DeserializeOwned>(entry: &Entry, what: &str) -> Result<T, BuildError> {
    serde_json::from_value(entry.clone()).map_err(|e| BuildError::invalid(what, e))
}

pub fn node_id(entry: &Entry) -> Result<u32, BuildError> {
    required_u32(entry, NODE_ID)
}

pub fn link_id(entry: &Entry) -> Result<u32, BuildError> {
    required_u32(entry, LINK_ID)
}

/// Entries of a list document. An absent (null) document has no entries.
pub fn entries(document: &Document) -> Option<&[Value]> {
    match document {
        Value::Null => Some(&[]),
        Value::Array(items) => Some(items.as_slice()),
        _ => None,
    }
}
