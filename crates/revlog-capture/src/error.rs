use revlog_history::LogError;
use revlog_types::TypeError;

/// Reasons a notification could not be recorded.
///
/// These never leave the crate's public API as errors; see
/// [`ChangeCapture::observe`](crate::ChangeCapture::observe).
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("cannot identify entity: {0}")]
    Identity(#[from] TypeError),

    #[error("entity {0} has no owning aggregate")]
    MissingOwner(String),

    #[error("mutation pair has neither a before nor an after document")]
    EmptyPair,

    #[error("revision log error: {0}")]
    Log(#[from] LogError),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
