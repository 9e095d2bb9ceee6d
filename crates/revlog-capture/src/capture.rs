use std::sync::Arc;

use chrono::Utc;
use revlog_content::{MutationEvent, MutationNotification, WriteOrigin};
use revlog_diff::{diff, normalize_ids, strip_fields};
use revlog_history::{AggregateLocks, RevisionLog};
use revlog_types::{AggregateId, EntityRef, NewRevision, RevisionAction, RevisionEntry, Target};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureResult};

/// What one notification produced.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome {
    /// One entry per entity whose change survived filtering.
    Recorded(Vec<RevisionEntry>),
    /// Aggregate roots were deleted and their revision sets removed.
    Destroyed(Vec<AggregateId>),
    /// Nothing worth recording.
    Ignored,
    /// Recording failed. The reason has already been logged.
    Failed(String),
}

/// Turns content mutations into revision entries.
pub struct ChangeCapture {
    log: Arc<dyn RevisionLog>,
    locks: Arc<AggregateLocks>,
    config: CaptureConfig,
}

impl ChangeCapture {
    pub fn new(
        log: Arc<dyn RevisionLog>,
        locks: Arc<AggregateLocks>,
        config: CaptureConfig,
    ) -> Self {
        Self { log, locks, config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Record a mutation notification.
    ///
    /// Never fails: errors are logged and reported as
    /// [`CaptureOutcome::Failed`]. Entries already appended for earlier
    /// documents of the same batch are kept.
    pub async fn observe(&self, notification: &MutationNotification) -> CaptureOutcome {
        match self.capture(notification).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    collection = %notification.collection,
                    event = notification.event.name(),
                    error = %err,
                    "failed to record revision"
                );
                CaptureOutcome::Failed(err.to_string())
            }
        }
    }

    async fn capture(&self, notification: &MutationNotification) -> CaptureResult<CaptureOutcome> {
        // A deleted root takes its whole subtree with it; per-entity diffs are moot.
        if let MutationEvent::Delete(docs) = &notification.event {
            let roots = self.roots_in(docs);
            if !roots.is_empty() {
                for root in &roots {
                    self.destroy(root).await?;
                }
                return Ok(CaptureOutcome::Destroyed(roots));
            }
        }

        let action = action_of(&notification.event);
        let mut recorded = Vec::new();

        for (before, after) in pairs(&notification.event) {
            let subject = after.or(before).ok_or(CaptureError::EmptyPair)?;
            let entity = self.config.fields.identify(subject)?;
            let is_root = entity.kind == self.config.root_type;

            if notification.origin == WriteOrigin::Revert {
                continue;
            }

            let aggregate = self.aggregate_of(&entity, is_root)?;
            let before = before.map(normalize_ids);
            let after = after.map(normalize_ids);

            let Some(delta) = diff(before.as_ref(), after.as_ref()) else {
                debug!(entity = %entity.id, "no structural change");
                continue;
            };
            let Some(delta) = strip_fields(delta, &self.config.volatile_fields) else {
                debug!(entity = %entity.id, "only volatile fields changed");
                continue;
            };

            let revision = NewRevision {
                target: Target {
                    id: entity.id.clone(),
                    kind: entity.kind.clone(),
                    collection: notification.collection.clone(),
                },
                action,
                diff: delta,
                timestamp: Utc::now(),
            };

            let entry = {
                let _guard = self.locks.lock(&aggregate).await;
                self.log.append(&aggregate, &notification.collection, revision)?
            };
            info!(
                aggregate = %aggregate,
                entity = %entity.id,
                sequence = entry.sequence,
                action = %entry.action,
                "recorded revision"
            );
            recorded.push(entry);
        }

        if recorded.is_empty() {
            Ok(CaptureOutcome::Ignored)
        } else {
            Ok(CaptureOutcome::Recorded(recorded))
        }
    }

    async fn destroy(&self, aggregate: &AggregateId) -> CaptureResult<()> {
        let existed = {
            let _guard = self.locks.lock(aggregate).await;
            self.log.destroy(aggregate)?
        };
        self.locks.forget(aggregate);
        info!(aggregate = %aggregate, existed, "aggregate deleted; revision set removed");
        Ok(())
    }

    /// Ids of every aggregate root among `docs`, in batch order.
    fn roots_in(&self, docs: &[Value]) -> Vec<AggregateId> {
        docs.iter()
            .filter_map(|doc| self.config.fields.identify(doc).ok())
            .filter(|entity| entity.kind == self.config.root_type)
            .map(|entity| entity.id)
            .collect()
    }

    fn aggregate_of(&self, entity: &EntityRef, is_root: bool) -> CaptureResult<AggregateId> {
        if is_root {
            return Ok(entity.id.clone());
        }
        entity
            .owner
            .clone()
            .ok_or_else(|| CaptureError::MissingOwner(entity.id.to_string()))
    }
}

fn action_of(event: &MutationEvent) -> RevisionAction {
    match event {
        MutationEvent::Insert(_) => RevisionAction::Insert,
        MutationEvent::Update { .. } | MutationEvent::Replace { .. } => RevisionAction::Update,
        MutationEvent::Delete(_) => RevisionAction::Delete,
    }
}

/// Flatten an event into `(before, after)` pairs, one per document.
fn pairs(event: &MutationEvent) -> Vec<(Option<&Value>, Option<&Value>)> {
    match event {
        MutationEvent::Insert(docs) => docs.iter().map(|d| (None, Some(d))).collect(),
        MutationEvent::Delete(docs) => docs.iter().map(|d| (Some(d), None)).collect(),
        MutationEvent::Update { before, after } | MutationEvent::Replace { before, after } => {
            vec![(Some(before), Some(after))]
        }
    }
}
