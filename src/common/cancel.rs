//! Cooperative cancellation of long running scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token that is polled between lines by scanners, filter generation and export.
///
/// Clones share the same flag, so the token can be handed to another thread (e.g., a UI) that
/// signals the stop while the scan keeps a clone.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stopped: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Construct a new, not yet cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the stop.
    pub fn cancel(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether the stop has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
