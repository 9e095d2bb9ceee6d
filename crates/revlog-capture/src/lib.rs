//! Change capture for revlog.
//!
//! Observes content mutation notifications and records each semantic change
//! as a revision entry in the owning aggregate's revision set. Capture is a
//! best-effort secondary observer: its failures are logged and never reach
//! the code that performed the mutation.

pub mod capture;
pub mod config;
pub mod error;
pub mod worker;

pub use capture::{CaptureOutcome, ChangeCapture};
pub use config::CaptureConfig;
pub use error::{CaptureError, CaptureResult};
pub use worker::CaptureWorker;
