// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! A hand-rolled cancellation token plus a grace-period-based shutdown
//! coordinator, kept independent of `tokio_util::sync::CancellationToken`
//! so the bootstrap crate stays free of the wider async-runtime stack
//! beyond bare `tokio`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner { cancelled: AtomicBool::new(false), notify: Notify::new() }),
        }
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Coordinates a graceful shutdown: cancels the token, then waits up to
/// `grace_period` for in-flight work to observe the signal before the
/// caller force-exits.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self { token: CancellationToken::new(), grace_period }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Signals shutdown and waits for `drained` to resolve or the grace
    /// period to elapse, whichever comes first. Returns `true` if
    /// `drained` finished within the grace period.
    pub async fn shutdown<F>(&self, drained: F) -> bool
    where
        F: std::future::Future<Output = ()>,
    {
        self.token.cancel();
        tokio::select! {
            _ = drained => true,
            _ = tokio::time::sleep(self.grace_period) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_resolves_immediately_once_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.cancelled().await;
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters_on_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_reports_true_when_drained_before_grace_period() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(200));
        let finished = coordinator.shutdown(async { /* instant */ }).await;
        assert!(finished);
        assert!(coordinator.token().is_cancelled());
    }

    #[tokio::test]
    async fn shutdown_reports_false_when_grace_period_elapses_first() {
        let coordinator = ShutdownCoordinator::new(Duration::from_millis(10));
        let finished = coordinator.shutdown(tokio::time::sleep(Duration::from_secs(5))).await;
        assert!(!finished);
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
