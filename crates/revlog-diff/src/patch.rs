//! Applying deltas in either direction.
//!
//! [`apply`] moves a value forward along a delta, [`unapply`] moves it
//! backward. Both walk the same delta tree with the direction flipped, so
//! unapplying never builds an inverted copy first.
//!
//! Leaves are written without comparing against the current value
//! (last writer wins), and removing a key or tail item that is already gone
//! is a no-op. Re-applying a delta to a value it was already applied to
//! therefore yields the same result.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::delta::Delta;
use crate::error::{DiffError, DiffResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// Apply `delta` to `value`, producing the newer side.
///
/// `None` means the value does not exist; a creation delta applied to `None`
/// yields the created value, a deletion delta yields `None`.
pub fn apply(delta: &Delta, value: Option<Value>) -> DiffResult<Option<Value>> {
    patch(delta, value, Direction::Forward, &mut Vec::new())
}

/// Apply `delta` backwards to `value`, producing the older side.
pub fn unapply(delta: &Delta, value: Option<Value>) -> DiffResult<Option<Value>> {
    patch(delta, value, Direction::Reverse, &mut Vec::new())
}

fn patch(
    delta: &Delta,
    value: Option<Value>,
    direction: Direction,
    path: &mut Vec<String>,
) -> DiffResult<Option<Value>> {
    use Direction::{Forward, Reverse};

    match (delta, direction) {
        (Delta::Added { value: v }, Forward) | (Delta::Removed { value: v }, Reverse) => {
            Ok(Some(v.clone()))
        }
        (Delta::Added { .. }, Reverse) | (Delta::Removed { .. }, Forward) => Ok(None),
        (Delta::Replaced { new, .. }, Forward) => Ok(Some(new.clone())),
        (Delta::Replaced { old, .. }, Reverse) => Ok(Some(old.clone())),
        (Delta::Object { fields }, _) => {
            let mut map = match value {
                Some(Value::Object(map)) => map,
                other => return Err(mismatch(path, "object", other.as_ref())),
            };
            for (key, child) in fields {
                path.push(key.clone());
                let current = map.remove(key);
                if let Some(next) = patch(child, current, direction, path)? {
                    map.insert(key.clone(), next);
                }
                path.pop();
            }
            Ok(Some(Value::Object(map)))
        }
        (Delta::Array { items }, _) => {
            let mut array = match value {
                Some(Value::Array(array)) => array,
                other => return Err(mismatch(path, "array", other.as_ref())),
            };
            let mut removed = BTreeSet::new();
            for (&index, child) in items {
                path.push(index.to_string());
                let current = array.get(index).cloned();
                match patch(child, current, direction, path)? {
                    Some(next) if index < array.len() => array[index] = next,
                    Some(next) if index == array.len() => array.push(next),
                    Some(_) => {
                        let len = array.len();
                        path.pop();
                        return Err(DiffError::IndexOutOfRange {
                            path: render(path),
                            index,
                            len,
                        });
                    }
                    None => {
                        removed.insert(index);
                    }
                }
                path.pop();
            }
            // Removals only ever target the tail; drop them back to front.
            for index in removed.into_iter().rev() {
                if index < array.len() {
                    array.remove(index);
                }
            }
            Ok(Some(Value::Array(array)))
        }
    }
}

fn mismatch(path: &[String], expected: &'static str, found: Option<&Value>) -> DiffError {
    DiffError::ShapeMismatch {
        path: render(path),
        expected,
        found: kind_of(found),
    }
}

fn render(path: &[String]) -> String {
    if path.is_empty() {
        "/".into()
    } else {
        format!("/{}", path.join("/"))
    }
}

fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None => "nothing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "bool",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
