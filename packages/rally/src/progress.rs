//! Progress reporting for the geocoding pass.
//!
//! Geocoding is the only slow step of a run (one HTTP round trip per rally,
//! rate limited), so [`crate::resolve::resolve_counties`] reports through
//! [`ProgressCallback`]. Rendering lives in the CLI utilities crate.

use std::sync::Arc;

/// Receives progress updates from long-running operations.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total expected units of work.
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Updates the message displayed alongside the indicator.
    fn set_message(&self, msg: String);

    /// Marks progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
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
