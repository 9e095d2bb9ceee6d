//! Structural diff codec for revlog.
//!
//! Computes invertible deltas between two versions of a JSON document and
//! applies them in either direction. The codec is pure: no I/O, no shared
//! state, safe to call from any thread.
//!
//! # Key Types
//!
//! - [`Delta`] / [`ChangeKind`] -- Structural difference and its classification
//! - [`diff`] / [`invert`] / [`apply`] / [`unapply`] -- Codec operations
//! - [`normalize_ids`] / [`restore_ids`] / [`strip_fields`] -- Pre- and post-processing
//! - [`ChangeLine`] / [`TextChange`] -- Flattened views for display

pub mod delta;
pub mod error;
pub mod normalize;
pub mod patch;
pub mod summary;
pub mod text;

pub use delta::{diff, invert, ChangeKind, Delta};
pub use error::{DiffError, DiffResult};
pub use normalize::{normalize_ids, restore_ids, strip_fields};
pub use patch::{apply, unapply};
pub use summary::{summarize, ChangeLine, LineKind};
pub use text::{diff_text, DiffHunk, DiffLine, TextChange};
