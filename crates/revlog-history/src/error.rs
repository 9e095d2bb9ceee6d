use revlog_types::TypeError;

/// Errors produced by revision log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("no revision set for aggregate {0}")]
    NotFound(String),

    #[error("revision set for {aggregate} is corrupt: {reason}")]
    Corrupt { aggregate: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("revision log unavailable: {0}")]
    Unavailable(String),
}

impl LogError {
    pub(crate) fn corrupt(aggregate: impl ToString, err: TypeError) -> Self {
        Self::Corrupt {
            aggregate: aggregate.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result alias for revision log operations.
pub type LogResult<T> = Result<T, LogError>;
