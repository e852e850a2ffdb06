//! # Provider Adapter
//!
//! The single capability the AI orchestrator sees for every heterogeneous
//! AI backend: `classify(prompt, hint) -> (answer, latency)`. Per
//! spec.md §9's "dynamic dispatch over heterogeneous AI clients" redesign
//! note, the orchestrator never knows about HTTP, auth, or per-vendor
//! request shaping — those live behind this trait in `catalog-engine`.

use async_trait::async_trait;
use std::time::Duration;

use crate::cancellation::CancellationToken;
use crate::error::CatalogError;

/// A single classification request: the rendered prompt plus an optional
/// category hint (e.g. the taxonomy path so far, for the hierarchical
/// classifier).
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub prompt: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClassifyResponse {
    pub answer: String,
    pub latency: Duration,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Performs one classification call. Implementations should honor
    /// `cancel` by aborting the in-flight request when the underlying
    /// transport supports cancellation; the orchestrator does not count
    /// a caller-cancelled call as a circuit failure.
    async fn classify(
        &self,
        request: ClassifyRequest,
        cancel: CancellationToken,
    ) -> Result<ClassifyResponse, CatalogError>;
}
