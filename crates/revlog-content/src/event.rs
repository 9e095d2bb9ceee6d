//! Mutation notifications emitted by content stores.

use serde_json::Value;

/// Who issued a content write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteOrigin {
    /// A regular authoring change.
    Editor,
    /// A write issued while reverting history.
    Revert,
}

/// A completed mutation. Inserts and deletes may be batched.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationEvent {
    Insert(Vec<Value>),
    Update { before: Value, after: Value },
    Replace { before: Value, after: Value },
    Delete(Vec<Value>),
}

impl MutationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update { .. } => "update",
            Self::Replace { .. } => "replace",
            Self::Delete(_) => "delete",
        }
    }

    /// Number of documents the mutation touched.
    pub fn len(&self) -> usize {
        match self {
            Self::Insert(docs) | Self::Delete(docs) => docs.len(),
            Self::Update { .. } | Self::Replace { .. } => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A mutation event together with the collection and origin of the write.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationNotification {
    pub collection: String,
    pub origin: WriteOrigin,
    pub event: MutationEvent,
}
