//! Delta computation and inversion.
//!
//! A [`Delta`] describes how to turn one JSON value into another. Objects are
//! compared key by key and arrays index by index, so a delta only carries the
//! parts that changed. Every delta holds both sides of each change, which is
//! what makes it invertible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structural difference between two JSON values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    /// The value did not exist before.
    Added { value: Value },
    /// The value ceased to exist.
    Removed { value: Value },
    /// The value was swapped for one of a different shape or a different scalar.
    Replaced { old: Value, new: Value },
    /// Per-key changes inside an object.
    Object { fields: BTreeMap<String, Delta> },
    /// Per-index changes inside an array. Growth and shrinkage only happen at
    /// the tail, as `Added` and `Removed` items.
    Array { items: BTreeMap<usize, Delta> },
}

/// How a top-level delta changes the existence of its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Creation,
    Deletion,
    Modification,
}

impl Delta {
    pub fn classify(&self) -> ChangeKind {
        match self {
            Self::Added { .. } => ChangeKind::Creation,
            Self::Removed { .. } => ChangeKind::Deletion,
            _ => ChangeKind::Modification,
        }
    }

    /// Number of leaf changes (added, removed, or replaced values).
    pub fn change_count(&self) -> usize {
        match self {
            Self::Added { .. } | Self::Removed { .. } | Self::Replaced { .. } => 1,
            Self::Object { fields } => fields.values().map(Delta::change_count).sum(),
            Self::Array { items } => items.values().map(Delta::change_count).sum(),
        }
    }
}

/// Compute the delta that turns `old` into `new`.
///
/// `None` on either side means the value does not exist. Returns `None` iff
/// the two sides are structurally equal.
pub fn diff(old: Option<&Value>, new: Option<&Value>) -> Option<Delta> {
    match (old, new) {
        (None, None) => None,
        (None, Some(new)) => Some(Delta::Added { value: new.clone() }),
        (Some(old), None) => Some(Delta::Removed { value: old.clone() }),
        (Some(old), Some(new)) => diff_values(old, new),
    }
}

fn diff_values(old: &Value, new: &Value) -> Option<Delta> {
    if old == new {
        return None;
    }
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => diff_objects(old, new),
        (Value::Array(old), Value::Array(new)) => diff_arrays(old, new),
        _ => Some(Delta::Replaced {
            old: old.clone(),
            new: new.clone(),
        }),
    }
}

fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>) -> Option<Delta> {
    let mut fields = BTreeMap::new();

    for (key, old_val) in old {
        if let Some(delta) = diff(Some(old_val), new.get(key)) {
            fields.insert(key.clone(), delta);
        }
    }
    for (key, new_val) in new {
        if !old.contains_key(key) {
            fields.insert(key.clone(), Delta::Added { value: new_val.clone() });
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(Delta::Object { fields })
    }
}

fn diff_arrays(old: &[Value], new: &[Value]) -> Option<Delta> {
    let mut items = BTreeMap::new();
    for index in 0..old.len().max(new.len()) {
        if let Some(delta) = diff(old.get(index), new.get(index)) {
            items.insert(index, delta);
        }
    }

    if items.is_empty() {
        None
    } else {
        Some(Delta::Array { items })
    }
}

/// Swap the two sides of a delta.
pub fn invert(delta: &Delta) -> Delta {
    match delta {
        Delta::Added { value } => Delta::Removed {
            value: value.clone(),
        },
        Delta::Removed { value } => Delta::Added {
            value: value.clone(),
        },
        Delta::Replaced { old, new } => Delta::Replaced {
            old: new.clone(),
            new: old.clone(),
        },
        Delta::Object { fields } => Delta::Object {
            fields: fields.iter().map(|(k, d)| (k.clone(), invert(d))).collect(),
        },
        Delta::Array { items } => Delta::Array {
            items: items.iter().map(|(i, d)| (*i, invert(d))).collect(),
        },
    }
}
