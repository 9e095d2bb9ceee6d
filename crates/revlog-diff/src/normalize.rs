//! Pre- and post-processing around the codec.
//!
//! Document stores may hand out identifier handles (extended-JSON
//! `{"$oid": "…"}` objects) that compare differently from the plain strings
//! they stand for. Values are normalized before diffing so deltas never
//! record a handle-vs-string change, and reconstructed values can have the
//! handles restored before they are written back.

use serde_json::{Map, Value};

use crate::delta::Delta;

const OID_KEY: &str = "$oid";

/// Collapse every `{"$oid": "…"}` handle in `value` into its string.
pub fn normalize_ids(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(id) = as_oid(map) {
                return Value::String(id.to_string());
            }
            Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_ids(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_ids).collect()),
        other => other.clone(),
    }
}

/// Wrap the listed top-level string fields of `value` back into `{"$oid": …}` handles.
pub fn restore_ids(mut value: Value, fields: &[String]) -> Value {
    if let Value::Object(map) = &mut value {
        for field in fields {
            let id = match map.get(field) {
                Some(Value::String(id)) => id.clone(),
                _ => continue,
            };
            let mut handle = Map::new();
            handle.insert(OID_KEY.into(), Value::String(id));
            map.insert(field.clone(), Value::Object(handle));
        }
    }
    value
}

/// Remove top-level `fields` from a modification delta.
///
/// Returns `None` when nothing else is left. Creation, deletion, and
/// replacement deltas are returned untouched: they carry whole values and
/// stripping them would lose data needed to reconstruct the entity.
pub fn strip_fields(delta: Delta, fields: &[String]) -> Option<Delta> {
    match delta {
        Delta::Object {
            fields: mut changes,
        } => {
            changes.retain(|key, _| !fields.contains(key));
            if changes.is_empty() {
                None
            } else {
                Some(Delta::Object { fields: changes })
            }
        }
        other => Some(other),
    }
}

fn as_oid(map: &Map<String, Value>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(OID_KEY).and_then(Value::as_str)
}
