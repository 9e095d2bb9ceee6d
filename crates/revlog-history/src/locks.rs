//! Per-aggregate exclusive sections.
//!
//! A revert reads the revision set, rewrites entities, and truncates the set.
//! An append landing in the middle would be lost by the truncation, so both
//! capture appends and reverts run while holding the aggregate's guard.
//! Different aggregates never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use revlog_types::AggregateId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of one async mutex per aggregate id.
#[derive(Debug, Default)]
pub struct AggregateLocks {
    locks: Mutex<HashMap<AggregateId, Arc<AsyncMutex<()>>>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `aggregate`. Released when the guard drops.
    pub async fn lock(&self, aggregate: &AggregateId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(aggregate.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the registry entry for `aggregate` if nobody holds or awaits it.
    pub fn forget(&self, aggregate: &AggregateId) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = locks.get(aggregate) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(aggregate);
            }
        }
    }

    /// Number of aggregates with a registered lock.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
