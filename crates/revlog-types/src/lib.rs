//! Foundation types for revlog.
//!
//! This crate provides the identity and history types shared by every other
//! revlog crate: the content side (entities and the document fields that
//! identify them) and the history side (revision entries grouped into one
//! revision set per aggregate root).
//!
//! # Key Types
//!
//! - [`EntityId`] -- Normalized identifier of a content entity
//! - [`DocumentFields`] -- Names of the id, type, and owner fields of a document
//! - [`Target`] -- The entity a revision entry applies to
//! - [`RevisionEntry`] -- One recorded change to one entity
//! - [`RevisionSet`] -- Ordered history of one aggregate root

pub mod document;
pub mod error;
pub mod id;
pub mod revision;

pub use document::{DocumentFields, EntityRef};
pub use error::TypeError;
pub use id::{AggregateId, EntityId};
pub use revision::{
    NewRevision, RevisionAction, RevisionEntry, RevisionSet, Sequence, Target, FIRST_SEQUENCE,
};
