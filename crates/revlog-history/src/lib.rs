//! Revision log store for revlog.
//!
//! Owns one [`RevisionSet`](revlog_types::RevisionSet) per aggregate root and
//! exposes the only four ways a set changes: append, read, truncate from a
//! sequence upward, and destroy.
//!
//! - [`RevisionLog`] -- storage trait
//! - [`InMemoryRevisionLog`] -- `HashMap`-backed log for tests and embedding
//! - [`FileRevisionLog`] -- one JSON file per aggregate, replaced atomically
//! - [`AggregateLocks`] -- per-aggregate exclusive sections shared by capture and revert
//!
//! Log writes never go through the content store, so they never produce
//! mutation notifications of their own.

pub mod error;
pub mod file;
pub mod locks;
pub mod memory;
pub mod traits;

pub use error::{LogError, LogResult};
pub use file::FileRevisionLog;
pub use locks::AggregateLocks;
pub use memory::InMemoryRevisionLog;
pub use traits::RevisionLog;
