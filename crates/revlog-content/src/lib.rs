//! Content store boundary for revlog.
//!
//! The content store holds the documents whose history is recorded. revlog
//! only needs a narrow slice of it: find, insert, update, replace, and delete
//! by query, plus a stream of mutation notifications. This crate defines that
//! slice as the [`ContentStore`] trait and ships an in-memory implementation.
//!
//! # Design Rules
//!
//! 1. Every write carries a [`WriteOrigin`]; every notification echoes it.
//! 2. Deleting an aggregate root deletes everything it owns in the same
//!    write. Each deleted root is reported as its own
//!    [`MutationEvent::Delete`] with the root first, followed by what it owns.
//! 3. Deleting a document that does not exist is not an error.
//! 4. Notifications are sent in write order, once the write is applied, and
//!    never block it.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::{ContentError, ContentResult};
pub use event::{MutationEvent, MutationNotification, WriteOrigin};
pub use memory::InMemoryContentStore;
pub use query::Query;
pub use traits::ContentStore;
