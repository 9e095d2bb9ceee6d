use async_trait::async_trait;
use revlog_types::{DocumentFields, EntityId};
use serde_json::{Map, Value};

use crate::error::ContentResult;
use crate::event::WriteOrigin;
use crate::query::Query;

/// Document store holding the content whose history is recorded.
///
/// Implementations must:
/// - Apply each call atomically; readers never observe half a write.
/// - Cascade the deletion of an aggregate root to every document it owns,
///   and report each deleted root in its own delete notification, root first.
/// - Emit notifications in the order the writes were applied.
/// - Treat deleting a missing document as success with nothing deleted.
/// - Report completed writes as mutation notifications tagged with the
///   caller's [`WriteOrigin`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of the collection the documents live in.
    fn collection(&self) -> &str;

    /// Identity field names of the stored documents.
    fn fields(&self) -> &DocumentFields;

    /// Top-level fields the backend stores as identifier handles.
    ///
    /// Values reconstructed from history have these restored before they are
    /// written back. Backends that store plain ids return nothing.
    fn id_fields(&self) -> &[String] {
        &[]
    }

    /// All documents matching `query`.
    async fn find(&self, query: &Query) -> ContentResult<Vec<Value>>;

    /// The document with `id`, if present.
    async fn find_one(&self, id: &EntityId) -> ContentResult<Option<Value>> {
        Ok(self.find(&Query::by_id(id.clone())).await?.into_iter().next())
    }

    /// Insert a new document and return it as stored.
    async fn insert(&self, document: Value, origin: WriteOrigin) -> ContentResult<Value>;

    /// Merge `changes` into the single document matching `query`.
    async fn update(
        &self,
        query: &Query,
        changes: Map<String, Value>,
        origin: WriteOrigin,
    ) -> ContentResult<Value>;

    /// Replace the single document matching `query` with `document`.
    async fn replace(
        &self,
        query: &Query,
        document: Value,
        origin: WriteOrigin,
    ) -> ContentResult<Value>;

    /// Delete every document matching `query` (plus cascades). Returns what was deleted.
    async fn delete(&self, query: &Query, origin: WriteOrigin) -> ContentResult<Vec<Value>>;
}
