use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// Identifier of a content entity, normalized to a plain string.
///
/// Document stores hand out ids in several shapes (strings, numbers,
/// extended-JSON `{"$oid": "…"}` handles). Revision history only ever
/// compares and stores the normalized string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

/// Aggregate roots are entities; the alias marks where a root id is expected.
pub type AggregateId = EntityId;

impl EntityId {
    /// Create an id from a non-empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidId("identifier is empty".into()));
        }
        Ok(Self(id))
    }

    /// Generate a fresh time-ordered id (UUID v7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    /// Read an id from a JSON value.
    ///
    /// Accepts strings, integers, and `{"$oid": "…"}` handles.
    pub fn from_value(value: &Value) -> Result<Self, TypeError> {
        match value {
            Value::String(s) => Self::new(s.clone()),
            Value::Number(n) => Self::new(n.to_string()),
            Value::Object(map) => match map.get("$oid") {
                Some(Value::String(s)) if map.len() == 1 => Self::new(s.clone()),
                _ => Err(TypeError::InvalidId(format!("unsupported id object {value}"))),
            },
            other => Err(TypeError::InvalidId(format!("unsupported id value {other}"))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id as a JSON string value.
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
