//! Revert engine for revlog.
//!
//! Restores earlier states of an aggregate's entities by unwinding recorded
//! deltas newest first, writing one reconstructed value per affected entity,
//! and truncating the consumed entries only once every write has succeeded.
//!
//! # Key Types
//!
//! - [`RevertEngine`] -- `undo_last` and `reset_to` entry points
//! - [`RevertReport`] / [`EntityOutcome`] / [`EntityWrite`] -- What a revert did
//! - [`RevertError`] -- Not found, integrity faults, partial write failures

pub mod engine;
pub mod error;
pub mod plan;
pub mod report;

pub use engine::RevertEngine;
pub use error::{RevertError, RevertResult};
pub use plan::{reconstruct, Reconstruction};
pub use report::{EntityOutcome, EntityWrite, RevertReport};
