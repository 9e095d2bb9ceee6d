//! Per-entity reconstruction.
//!
//! Each delta is only valid against the state produced by the entry right
//! before it, so an entity's entries are unwound newest first, carrying the
//! value from one step into the next.

use revlog_diff::{unapply, ChangeKind};
use revlog_types::{EntityId, RevisionEntry, Sequence};
use serde_json::Value;

use crate::error::{RevertError, RevertResult};

/// The state an entity had before the unwound entries.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconstruction {
    /// The entity existed with this (normalized) value.
    Exists(Value),
    /// The entity did not exist.
    Absent,
    /// The entity is gone and nothing in the entries brings it back.
    Missing,
}

/// Unwind `entries` (newest first) starting from the entity's `current` value.
///
/// Fails with [`RevertError::IntegrityFault`] when the entries would both
/// delete and recreate the entity, or modify it before it was created.
pub fn reconstruct(
    entity: &EntityId,
    current: Option<Value>,
    entries: &[&RevisionEntry],
) -> RevertResult<Reconstruction> {
    let creates = entries
        .iter()
        .any(|e| e.diff.classify() == ChangeKind::Creation);
    let mut created_at: Option<Sequence> = None;
    let mut state = current;

    for entry in entries {
        match entry.diff.classify() {
            ChangeKind::Creation => {
                state = unapply(&entry.diff, state)?;
                created_at = Some(entry.sequence);
            }
            ChangeKind::Deletion => {
                if let Some(created) = created_at {
                    return Err(fault(
                        entity,
                        format!(
                            "revision {created} creates it after revision {} deletes it",
                            entry.sequence
                        ),
                    ));
                }
                state = unapply(&entry.diff, state)?;
            }
            ChangeKind::Modification => match state {
                Some(value) => state = unapply(&entry.diff, Some(value))?,
                None if created_at.is_some() => {
                    return Err(fault(
                        entity,
                        format!("revision {} modifies it before it exists", entry.sequence),
                    ));
                }
                // Already removed by an earlier attempt; an older creation entry decides.
                None if creates => {}
                None => return Ok(Reconstruction::Missing),
            },
        }
    }

    Ok(match state {
        Some(value) => Reconstruction::Exists(value),
        None => Reconstruction::Absent,
    })
}

fn fault(entity: &EntityId, reason: String) -> RevertError {
    RevertError::IntegrityFault {
        entity: entity.to_string(),
        reason,
    }
}
