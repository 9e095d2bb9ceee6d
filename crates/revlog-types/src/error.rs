use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("document is missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("revision set out of order at seq {seq}: {reason}")]
    OutOfOrder { seq: u64, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
