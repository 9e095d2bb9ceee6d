//! Identity fields of content documents.
//!
//! Content entities are stored as JSON documents. [`DocumentFields`] names
//! the three fields revlog needs to read from every document: its id, its
//! type, and the reference to the aggregate root that owns it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::id::EntityId;

/// Field names used to identify an entity inside a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    /// Field holding the entity id.
    pub id: String,
    /// Field holding the entity type (e.g. `course`, `block`).
    pub kind: String,
    /// Field holding the owning aggregate root's id on non-root entities.
    pub owner: String,
}

impl Default for DocumentFields {
    fn default() -> Self {
        Self {
            id: "_id".into(),
            kind: "_type".into(),
            owner: "_courseId".into(),
        }
    }
}

/// Identity of one entity, read from its document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRef {
    pub id: EntityId,
    pub kind: String,
    /// `None` for aggregate roots and for documents without an owner field.
    pub owner: Option<EntityId>,
}

impl DocumentFields {
    /// Read the identity of a document.
    pub fn identify(&self, document: &Value) -> Result<EntityRef, TypeError> {
        let object = document.as_object().ok_or_else(|| TypeError::InvalidField {
            field: self.id.clone(),
            reason: "document is not an object".into(),
        })?;

        let id = object
            .get(&self.id)
            .ok_or_else(|| TypeError::MissingField(self.id.clone()))
            .and_then(EntityId::from_value)?;

        let kind = match object.get(&self.kind) {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => {
                return Err(TypeError::InvalidField {
                    field: self.kind.clone(),
                    reason: format!("expected string, found {other}"),
                })
            }
            None => return Err(TypeError::MissingField(self.kind.clone())),
        };

        let owner = match object.get(&self.owner) {
            None | Some(Value::Null) => None,
            Some(value) => Some(EntityId::from_value(value)?),
        };

        Ok(EntityRef { id, kind, owner })
    }

    /// Read only the id of a document.
    pub fn id_of(&self, document: &Value) -> Result<EntityId, TypeError> {
        document
            .get(&self.id)
            .ok_or_else(|| TypeError::MissingField(self.id.clone()))
            .and_then(EntityId::from_value)
    }
}
