use std::fmt;

use revlog_types::{DocumentFields, EntityId};
use serde_json::Value;

/// Conjunctive filter over document identity fields. An empty query matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub id: Option<EntityId>,
    pub kind: Option<String>,
    pub owner: Option<EntityId>,
}

impl Query {
    pub fn by_id(id: EntityId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn owned_by(owner: EntityId) -> Self {
        Self {
            owner: Some(owner),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Whether `document` satisfies every set filter.
    pub fn matches(&self, document: &Value, fields: &DocumentFields) -> bool {
        if let Some(id) = &self.id {
            match fields.id_of(document) {
                Ok(doc_id) if &doc_id == id => {}
                _ => return false,
            }
        }
        if let Some(kind) = &self.kind {
            if document.get(&fields.kind).and_then(Value::as_str) != Some(kind.as_str()) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            let doc_owner = document
                .get(&fields.owner)
                .and_then(|v| EntityId::from_value(v).ok());
            if doc_owner.as_ref() != Some(owner) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = &self.id {
            parts.push(format!("id={id}"));
        }
        if let Some(kind) = &self.kind {
            parts.push(format!("type={kind}"));
        }
        if let Some(owner) = &self.owner {
            parts.push(format!("owner={owner}"));
        }
        if parts.is_empty() {
            f.write_str("{}")
        } else {
            write!(f, "{{{}}}", parts.join(", "))
        }
    }
}
