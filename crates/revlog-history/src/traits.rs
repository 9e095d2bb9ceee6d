use revlog_types::{AggregateId, NewRevision, RevisionEntry, RevisionSet, Sequence};

use crate::error::LogResult;

/// Storage for per-aggregate revision sets.
///
/// Implementations must:
/// - Assign sequences inside `append` atomically, so concurrent appends to
///   one aggregate never observe or hand out the same sequence.
/// - Never reuse a sequence, including after `truncate_from`.
/// - Keep entries oldest first.
pub trait RevisionLog: Send + Sync {
    /// Append a revision to the aggregate's set, creating the set on first use.
    fn append(
        &self,
        aggregate: &AggregateId,
        collection: &str,
        revision: NewRevision,
    ) -> LogResult<RevisionEntry>;

    /// Read the whole set. Returns `Ok(None)` if the aggregate has no set.
    fn read(&self, aggregate: &AggregateId) -> LogResult<Option<RevisionSet>>;

    /// Drop every entry with `sequence >= from`. Returns how many were dropped.
    fn truncate_from(&self, aggregate: &AggregateId, from: Sequence) -> LogResult<usize>;

    /// Remove the whole set. Returns `true` if it existed.
    fn destroy(&self, aggregate: &AggregateId) -> LogResult<bool>;

    /// Every aggregate that currently has a set.
    fn aggregates(&self) -> LogResult<Vec<AggregateId>>;

    /// Number of entries in the aggregate's set (0 if absent).
    fn entry_count(&self, aggregate: &AggregateId) -> LogResult<usize> {
        Ok(self.read(aggregate)?.map(|s| s.len()).unwrap_or(0))
    }
}
