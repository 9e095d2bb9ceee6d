//! Revision entries and the per-aggregate revision set.

use chrono::{DateTime, Utc};
use revlog_diff::Delta;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{AggregateId, EntityId};

/// Position of an entry in its revision set. Strictly increasing, never reused.
pub type Sequence = u64;

/// Sequence assigned to the first entry of a new set. `0` means "before any entry".
pub const FIRST_SEQUENCE: Sequence = 1;

/// The kind of mutation that produced a revision entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionAction {
    Insert,
    Update,
    Delete,
}

impl std::fmt::Display for RevisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert => f.write_str("insert"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// The entity a revision entry applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: String,
    pub collection: String,
}

/// A change that has been captured but not yet assigned a sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRevision {
    pub target: Target,
    pub action: RevisionAction,
    pub diff: Delta,
    pub timestamp: DateTime<Utc>,
}

/// One recorded change to one entity. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub sequence: Sequence,
    pub target: Target,
    pub action: RevisionAction,
    pub diff: Delta,
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of one aggregate root, oldest entry first.
///
/// `next_sequence` is persisted alongside the entries so that truncation
/// never lets a sequence be handed out twice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSet {
    pub aggregate_id: AggregateId,
    pub aggregate_collection: String,
    #[serde(default = "first_sequence")]
    pub next_sequence: Sequence,
    pub entries: Vec<RevisionEntry>,
}

fn first_sequence() -> Sequence {
    FIRST_SEQUENCE
}

impl RevisionSet {
    /// Create an empty set.
    pub fn new(aggregate_id: AggregateId, aggregate_collection: impl Into<String>) -> Self {
        Self {
            aggregate_id,
            aggregate_collection: aggregate_collection.into(),
            next_sequence: FIRST_SEQUENCE,
            entries: Vec::new(),
        }
    }

    /// Assign the next sequence to `revision` and append it.
    pub fn append(&mut self, revision: NewRevision) -> RevisionEntry {
        let floor = self.latest().map(|e| e.sequence + 1).unwrap_or(FIRST_SEQUENCE);
        let sequence = self.next_sequence.max(floor);
        self.next_sequence = sequence + 1;

        let entry = RevisionEntry {
            sequence,
            target: revision.target,
            action: revision.action,
            diff: revision.diff,
            timestamp: revision.timestamp,
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Drop every entry with `sequence >= from`. Returns the number removed.
    pub fn truncate_from(&mut self, from: Sequence) -> usize {
        let keep = self.entries.partition_point(|e| e.sequence < from);
        let removed = self.entries.len() - keep;
        self.entries.truncate(keep);
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&RevisionEntry> {
        self.entries.last()
    }

    /// Whether an entry with this sequence is present.
    pub fn contains(&self, sequence: Sequence) -> bool {
        self.entries
            .binary_search_by_key(&sequence, |e| e.sequence)
            .is_ok()
    }

    /// Entries with `sequence > retain`, oldest first.
    pub fn entries_after(&self, retain: Sequence) -> &[RevisionEntry] {
        let start = self.entries.partition_point(|e| e.sequence <= retain);
        &self.entries[start..]
    }

    /// Up to `limit` entries, newest first.
    pub fn newest_first(&self, limit: usize) -> Vec<RevisionEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Check strict sequence ordering and that `next_sequence` is ahead of every entry.
    pub fn validate(&self) -> Result<(), TypeError> {
        let mut previous: Option<Sequence> = None;
        for entry in &self.entries {
            if entry.sequence < FIRST_SEQUENCE {
                return Err(TypeError::OutOfOrder {
                    seq: entry.sequence,
                    reason: "sequence below first sequence".into(),
                });
            }
            if let Some(prev) = previous {
                if entry.sequence <= prev {
                    return Err(TypeError::OutOfOrder {
                        seq: entry.sequence,
                        reason: format!("expected sequence greater than {prev}"),
                    });
                }
            }
            previous = Some(entry.sequence);
        }
        if let Some(last) = previous {
            if self.next_sequence <= last {
                return Err(TypeError::OutOfOrder {
                    seq: last,
                    reason: format!("next sequence {} would be reused", self.next_sequence),
                });
            }
        }
        Ok(())
    }
}
