//! # Similarity and Fingerprint Service Interfaces
//!
//! Trait seams for §4.2's fingerprinting and hybrid similarity, so the
//! refine-clustering stage and the quality assessor can share one
//! implementation (`catalog-engine`'s `infrastructure::similarity_cache`)
//! without the domain layer knowing about caching, locking, or the
//! concurrency primitives behind it.

use async_trait::async_trait;

use crate::value_objects::{Fingerprint, SimilarityScore};

pub trait FingerprintService: Send + Sync {
    fn compute(&self, normalized_name: &str, attributes: &[(String, String)]) -> Fingerprint;
}

/// A candidate for hybrid-similarity comparison: a normalized name plus
/// the structured attributes relevant to attribute-overlap scoring.
#[derive(Debug, Clone)]
pub struct SimilarityCandidate {
    pub normalized_name: String,
    pub attributes: Vec<(String, String)>,
}

#[async_trait]
pub trait SimilarityService: Send + Sync {
    /// Computes (or returns the cached) hybrid similarity between two
    /// candidates. Implementations must guarantee at-most-one concurrent
    /// computation per unordered (a, b) key (spec.md §4.2, §8).
    async fn similarity(&self, a: &SimilarityCandidate, b: &SimilarityCandidate) -> SimilarityScore;
}
