//! # Benchmark Finder
//!
//! Injected capability consulted by both the AI-classify pipeline stage
//! and the hierarchical classifier before any AI call, per spec.md §4.1
//! and §4.4. Kept as a one-directional capability — the benchmark service
//! does not know about its callers — per the "cyclic ownership" redesign
//! note in spec.md §9.

use async_trait::async_trait;

use crate::value_objects::SimilarityScore;

#[derive(Debug, Clone)]
pub struct BenchmarkMatch {
    pub name: String,
    pub code: String,
    pub similarity: SimilarityScore,
}

#[async_trait]
pub trait BenchmarkFinder: Send + Sync {
    /// Returns the closest benchmark match for `name`, if any meets the
    /// caller's similarity floor. Callers compare `similarity` against
    /// their own threshold (0.92 for short-circuit, [0.70, 0.92) for
    /// quality-assessor suggestions).
    async fn find_closest(&self, name: &str) -> Option<BenchmarkMatch>;
}
