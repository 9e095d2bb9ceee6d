use revlog_types::{RevisionEntry, Sequence};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An aggregate together with its most recent revisions.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct History {
    /// The aggregate root document.
    pub aggregate: Value,
    /// Newest first.
    pub entries: Vec<RevisionEntry>,
}

/// A revert call as received from a client.
///
/// `recursive = false` undoes the latest entry and ignores
/// `target_sequence`; `recursive = true` resets to `target_sequence`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertRequest {
    pub aggregate_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sequence: Option<Sequence>,
    #[serde(default)]
    pub recursive: bool,
}

impl RevertRequest {
    pub fn undo_last(aggregate_id: impl Into<String>) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            target_sequence: None,
            recursive: false,
        }
    }

    pub fn reset_to(aggregate_id: impl Into<String>, target: Sequence) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            target_sequence: Some(target),
            recursive: true,
        }
    }
}
