//! In-memory revision log.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use revlog_types::{AggregateId, NewRevision, RevisionEntry, RevisionSet, Sequence};

use crate::error::{LogError, LogResult};
use crate::traits::RevisionLog;

/// [`RevisionLog`] backed by a `HashMap` behind a `RwLock`.
///
/// Sequence assignment happens under the write lock, which makes it atomic
/// with respect to every other append.
#[derive(Debug, Default)]
pub struct InMemoryRevisionLog {
    sets: RwLock<HashMap<AggregateId, RevisionSet>>,
}

impl InMemoryRevisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_sets(&self) -> LogResult<RwLockReadGuard<'_, HashMap<AggregateId, RevisionSet>>> {
        self.sets
            .read()
            .map_err(|_| LogError::Unavailable("revision log read lock poisoned".into()))
    }

    fn write_sets(&self) -> LogResult<RwLockWriteGuard<'_, HashMap<AggregateId, RevisionSet>>> {
        self.sets
            .write()
            .map_err(|_| LogError::Unavailable("revision log write lock poisoned".into()))
    }
}

impl RevisionLog for InMemoryRevisionLog {
    fn append(
        &self,
        aggregate: &AggregateId,
        collection: &str,
        revision: NewRevision,
    ) -> LogResult<RevisionEntry> {
        let mut sets = self.write_sets()?;
        let set = sets
            .entry(aggregate.clone())
            .or_insert_with(|| RevisionSet::new(aggregate.clone(), collection));
        Ok(set.append(revision))
    }

    fn read(&self, aggregate: &AggregateId) -> LogResult<Option<RevisionSet>> {
        Ok(self.read_sets()?.get(aggregate).cloned())
    }

    fn truncate_from(&self, aggregate: &AggregateId, from: Sequence) -> LogResult<usize> {
        let mut sets = self.write_sets()?;
        let set = sets
            .get_mut(aggregate)
            .ok_or_else(|| LogError::NotFound(aggregate.to_string()))?;
        Ok(set.truncate_from(from))
    }

    fn destroy(&self, aggregate: &AggregateId) -> LogResult<bool> {
        Ok(self.write_sets()?.remove(aggregate).is_some())
    }

    fn aggregates(&self) -> LogResult<Vec<AggregateId>> {
        let mut ids: Vec<AggregateId> = self.read_sets()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
