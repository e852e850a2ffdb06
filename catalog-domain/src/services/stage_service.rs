//! # Stage Service
//!
//! The capability every one of the twelve pipeline stages implements.
//! Grounded on the teacher's `StageService` trait (`services/
//! stage_service.rs`): a small, uniform contract interpreted by one
//! generic runner (`catalog-engine`'s `StageRunner`), the concrete form of
//! the "declarative stage descriptors" redesign direction.

use async_trait::async_trait;

use crate::entities::NormalizedItem;
use crate::error::CatalogError;

/// A batch of normalized items handed to a stage together, so a stage may
/// apply store-level batching (and so `pipeline_batch_size` bounds memory
/// consistently across stages).
pub type StageBatch = Vec<NormalizedItem>;

/// Per-item outcome of running a stage: either the item advanced, or it
/// recorded an error without aborting the rest of the batch.
pub enum StageOutcome {
    Advanced(NormalizedItem),
    Errored { item: NormalizedItem, message: String },
}

#[async_trait]
pub trait StageService: Send + Sync {
    /// Stable, human-readable stage name used in logs, metrics labels,
    /// and the `StageBatchCompleted` event.
    fn name(&self) -> &'static str;

    /// Whether `item` has already satisfied this stage's precondition
    /// (the previous stage's completion flag) and has not yet completed
    /// this stage itself — i.e. whether it is eligible to run.
    fn is_eligible(&self, item: &NormalizedItem) -> bool;

    /// Applies this stage to one item. Implementations must be
    /// idempotent: calling this again on an item that already completed
    /// the stage is a no-op that returns `StageOutcome::Advanced`
    /// unchanged.
    async fn apply(&self, item: NormalizedItem) -> StageOutcome;

    /// Runs the stage over an eligible batch, returning the advanced
    /// items and any per-item error messages (already attached to the
    /// returned item's `last_error`, and returned alongside for the
    /// caller to log/count without re-inspecting every item).
    async fn run_batch(&self, batch: StageBatch) -> Result<Vec<NormalizedItem>, CatalogError> {
        let mut out = Vec::with_capacity(batch.len());
        for item in batch {
            if !self.is_eligible(&item) {
                out.push(item);
                continue;
            }
            match self.apply(item).await {
                StageOutcome::Advanced(item) => out.push(item),
                StageOutcome::Errored { item, .. } => out.push(item),
            }
        }
        Ok(out)
    }
}
