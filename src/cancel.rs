//! Cooperative cancellation for long ingestion runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag, checked once per window read.
///
/// Clones observe the same flag, so one handle can be given to a signal
/// handler or another thread while the ingestion loop holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stop_requested: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the ingestion loop to stop before its next window read.
    pub fn cancel(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}
