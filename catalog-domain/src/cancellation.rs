//! # Cancellation Token
//!
//! A cooperative cancellation signal shared across the pipeline engine,
//! the AI orchestrator, and provider adapters, grounded on the teacher's
//! hand-rolled `CancellationToken` (`adaptive_pipeline_bootstrap::
//! shutdown`): a shared flag plus a `Notify` for waiters, rather than
//! pulling in a dedicated crate for a single small primitive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already cancelled, otherwise waits for the
    /// next `cancel()` call. Used at stage-batch and AI-call submission
    /// boundaries (spec.md §4.1, §5).
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}
