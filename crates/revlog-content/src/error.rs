use revlog_types::TypeError;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// No document matched the query.
    #[error("no document matches {0}")]
    NotFound(String),

    /// More than one document matched a query that must be unique.
    #[error("{count} documents match {query}, expected one")]
    Ambiguous { query: String, count: usize },

    /// A document with this id already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// The document is not a JSON object or breaks an identity rule.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// The backend could not serve the request.
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for content store operations.
pub type ContentResult<T> = Result<T, ContentError>;
