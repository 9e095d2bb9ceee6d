//! High-level SDK for revlog.
//!
//! [`Revisions`] wires a content store, the change capture observing it, a
//! revision log, and the revert engine from one [`RevisionsConfig`], and
//! exposes the two operations callers need: reading an aggregate's history
//! and reverting it.

pub mod config;
pub mod error;
pub mod request;
pub mod revisions;

pub use config::RevisionsConfig;
pub use error::{SdkError, SdkResult};
pub use request::{History, RevertRequest};
pub use revisions::Revisions;

// Re-export key types
pub use revlog_content::{ContentStore, InMemoryContentStore, Query, WriteOrigin};
pub use revlog_revert::{EntityOutcome, EntityWrite, RevertReport};
pub use revlog_types::{AggregateId, EntityId, RevisionEntry, Sequence};
