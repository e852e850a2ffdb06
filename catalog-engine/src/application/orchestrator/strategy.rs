//! # Dispatch Strategy
//!
//! How the orchestrator orders eligible providers for a `classify` call
//! (spec.md §4.3). Switching strategy at runtime (`SetStrategy`) only
//! changes ordering for subsequent calls; in-flight calls are unaffected.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::ProviderRuntime;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Priority,
    RoundRobin,
    LeastLoaded,
    Fastest,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(Self::Priority),
            "round_robin" => Ok(Self::RoundRobin),
            "least_loaded" => Ok(Self::LeastLoaded),
            "fastest" => Ok(Self::Fastest),
            other => Err(format!("unknown dispatch strategy: {other}")),
        }
    }
}

/// Orders `candidates` per `strategy`. `round_robin_idx` is shared state
/// advanced once per call so consecutive calls rotate the starting point.
pub fn order(
    strategy: Strategy,
    candidates: &[Arc<ProviderRuntime>],
    round_robin_idx: &AtomicUsize,
) -> Vec<Arc<ProviderRuntime>> {
    let mut ordered: Vec<Arc<ProviderRuntime>> = candidates.to_vec();

    match strategy {
        Strategy::Priority => {
            ordered.sort_by_key(|p| (p.provider.lock().priority().value(), p.provider.lock().provider_key().to_string()));
        }
        Strategy::RoundRobin => {
            ordered.sort_by_key(|p| p.provider.lock().provider_key().to_string());
            if !ordered.is_empty() {
                let start = round_robin_idx.fetch_add(1, Ordering::Relaxed) % ordered.len();
                ordered.rotate_left(start);
            }
        }
        Strategy::LeastLoaded => {
            ordered.sort_by(|a, b| {
                let load_a = a.load_ratio();
                let load_b = b.load_ratio();
                load_a
                    .partial_cmp(&load_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.provider.lock().priority().value().cmp(&b.provider.lock().priority().value()))
            });
        }
        Strategy::Fastest => {
            ordered.sort_by(|a, b| {
                a.metrics
                    .avg_latency_ms()
                    .partial_cmp(&b.metrics.avg_latency_ms())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.provider.lock().priority().value().cmp(&b.provider.lock().priority().value()))
            });
        }
    }

    ordered
}
