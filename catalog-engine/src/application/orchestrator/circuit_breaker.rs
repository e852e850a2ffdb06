//! # Circuit Cooldown
//!
//! Cooldown-duration bookkeeping for a provider's circuit breaker
//! (spec.md §4.3): the first trip opens for `base_cooldown_ms`; a
//! half-open trial that fails again doubles the cooldown, capped at
//! `max_cooldown_ms`. A successful trial (`Provider::record_success`)
//! resets the tracked duration back to `base_cooldown_ms` for the next
//! time the circuit trips.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct CooldownTracker {
    base_ms: u64,
    max_ms: u64,
    current_ms: AtomicU64,
}

impl CooldownTracker {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            current_ms: AtomicU64::new(base_ms),
        }
    }

    /// Cooldown to apply for a failure. `was_half_open` distinguishes a
    /// half-open trial failing (double the last cooldown) from an
    /// ordinary failure tripping the circuit for the first time (use the
    /// base cooldown).
    pub fn next_cooldown_ms(&self, was_half_open: bool) -> u64 {
        if was_half_open {
            let doubled = self.current_ms.load(Ordering::Relaxed).saturating_mul(2).min(self.max_ms);
            self.current_ms.store(doubled, Ordering::Relaxed);
            doubled
        } else {
            self.current_ms.store(self.base_ms, Ordering::Relaxed);
            self.base_ms
        }
    }

    pub fn reset(&self) {
        self.current_ms.store(self.base_ms, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_on_half_open_failure_and_caps() {
        let tracker = CooldownTracker::new(1_000, 5_000);
        assert_eq!(tracker.next_cooldown_ms(false), 1_000);
        assert_eq!(tracker.next_cooldown_ms(true), 2_000);
        assert_eq!(tracker.next_cooldown_ms(true), 4_000);
        assert_eq!(tracker.next_cooldown_ms(true), 5_000);
    }

    #[test]
    fn reset_returns_to_base() {
        let tracker = CooldownTracker::new(1_000, 5_000);
        tracker.next_cooldown_ms(true);
        tracker.reset();
        assert_eq!(tracker.next_cooldown_ms(false), 1_000);
    }
}
