use revlog_types::{AggregateId, Sequence, Target};
use serde::Serialize;
use serde_json::Value;

/// The write a revert issued (or skipped) for one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityWrite {
    Deleted,
    Inserted,
    Replaced,
    /// The entity already held its reconstructed value.
    Unchanged,
    /// The entity no longer exists and its history only modifies it.
    Missing,
}

/// Result of reverting one entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOutcome {
    pub target: Target,
    pub write: EntityWrite,
    /// The entity as stored after the revert, `None` if it does not exist.
    pub state: Option<Value>,
}

/// Summary of a committed revert.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertReport {
    pub aggregate_id: AggregateId,
    /// Sequences that were unwound, newest first.
    pub undone: Vec<Sequence>,
    /// Lowest unwound sequence; every entry from here up was dropped.
    pub truncated_from: Sequence,
    pub outcomes: Vec<EntityOutcome>,
}

impl RevertReport {
    pub fn outcome(&self, entity: &str) -> Option<&EntityOutcome> {
        self.outcomes.iter().find(|o| o.target.id.as_str() == entity)
    }

    /// Number of entities actually written.
    pub fn writes(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.write,
                    EntityWrite::Deleted | EntityWrite::Inserted | EntityWrite::Replaced
                )
            })
            .count()
    }
}
