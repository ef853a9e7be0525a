//! Progress reporting for long-running loads and scans.
//!
//! [`ProgressCallback`] keeps library code independent of how progress is
//! shown. The CLI renders it with `indicatif` bars; the server and tests
//! use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a long-running operation.
///
/// Implementations must be `Send + Sync` so one reporter can be shared
/// with the `rayon` workers evaluating a grid.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Updates the message shown alongside the indicator.
    fn set_message(&self, msg: String);

    /// Marks progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
