use revlog_content::ContentError;
use revlog_diff::DiffError;
use revlog_history::LogError;
use revlog_types::{EntityId, Sequence};

/// Errors from revert operations. All of them reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum RevertError {
    /// The aggregate has no revision set, or nothing to revert.
    #[error("nothing to revert: {0}")]
    NotFound(String),

    /// `reset_to` named a sequence the aggregate's set does not hold.
    #[error("aggregate {aggregate} has no revision {sequence}")]
    SequenceNotFound { aggregate: String, sequence: Sequence },

    /// The selected entries contradict each other for one entity.
    /// Raised before any write; the log is untouched.
    #[error("contradictory history for {entity}: {reason}")]
    IntegrityFault { entity: String, reason: String },

    /// Some entity writes failed. The log is untouched, so the same revert
    /// can be retried.
    #[error(
        "{} entity writes failed, {} succeeded; revision log left intact",
        .failed.len(),
        .succeeded.len()
    )]
    PartialWrite {
        succeeded: Vec<EntityId>,
        failed: Vec<(EntityId, String)>,
    },

    #[error("revision log error: {0}")]
    Log(#[from] LogError),

    #[error("content store error: {0}")]
    Content(#[from] ContentError),

    #[error("cannot unwind delta: {0}")]
    Codec(#[from] DiffError),
}

pub type RevertResult<T> = Result<T, RevertError>;
