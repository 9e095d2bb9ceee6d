use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("change capture already runs on a background task")]
    CaptureRunning,

    #[error("identifier error: {0}")]
    Type(#[from] revlog_types::TypeError),

    #[error("content error: {0}")]
    Content(#[from] revlog_content::ContentError),

    #[error("revision log error: {0}")]
    Log(#[from] revlog_history::LogError),

    #[error(transparent)]
    Revert(#[from] revlog_revert::RevertError),
}

pub type SdkResult<T> = Result<T, SdkError>;
