//! # Final Decision Stage
//!
//! Chooses the best candidate across every source feeding a normalized
//! group and writes the finished row (spec.md §4.1 step 12). Overrides
//! `run_batch` rather than `apply`: unlike the other eleven stages, this
//! one is inherently cross-item — picking a group's winner needs every
//! member of the group, not just the ones that happened to land in this
//! batch, so each distinct `normalized_reference` touched by the batch is
//! re-fetched from the store in full before a decision is made.
//!
//! Winner selection mirrors `DuplicateGroup::new`'s convention elsewhere
//! in this crate: highest confidence, ties broken by the lowest id.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::NormalizedItemRepository;
use catalog_domain::services::{StageBatch, StageOutcome, StageService};

pub struct FinalDecisionStage {
    repository: Arc<dyn NormalizedItemRepository>,
}

impl FinalDecisionStage {
    pub fn new(repository: Arc<dyn NormalizedItemRepository>) -> Self {
        Self { repository }
    }

    fn pick_winner(group: &[NormalizedItem]) -> usize {
        group
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.confidence()
                    .value()
                    .partial_cmp(&b.confidence().value())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.id().cmp(&a.id()))
            })
            .map(|(idx, _)| idx)
            .expect("group is never empty")
    }
}

#[async_trait]
impl StageService for FinalDecisionStage {
    fn name(&self) -> &'static str {
        "stage9_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage8_completed && !item.stages().final_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let now = Utc::now();
        item.finalize(item.taxonomy_name().map(str::to_string), now);
        StageOutcome::Advanced(item)
    }

    async fn run_batch(&self, batch: StageBatch) -> Result<Vec<NormalizedItem>, CatalogError> {
        let (eligible, rest): (Vec<_>, Vec<_>) = batch.into_iter().partition(|item| self.is_eligible(item));

        let mut references: Vec<String> = eligible
            .iter()
            .map(|item| item.normalized_reference().to_string())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        references.sort();

        let mut updated_by_reference: Vec<NormalizedItem> = Vec::new();
        let now = Utc::now();

        for reference in references {
            let mut group = self.repository.find_by_normalized_reference(&reference).await?;
            if group.is_empty() {
                continue;
            }
            let winner_idx = Self::pick_winner(&group);
            let winner = group[winner_idx].clone();
            let merged_count = group.len() as u32;

            for member in &mut group {
                member.set_merged_count(merged_count);
                if member.id() != winner.id() {
                    if let (Some(code), Some(name)) = (winner.taxonomy_code(), winner.taxonomy_name()) {
                        let _ = member.classify(code, name, winner.confidence(), winner.processing_level(), winner.ai_reasoning().map(str::to_string));
                    }
                }
                member.finalize(winner.category_label().map(str::to_string).or_else(|| winner.taxonomy_name().map(str::to_string)), now);
            }

            self.repository.save_batch(&group).await?;
            updated_by_reference.extend(group);
        }

        let untouched: Vec<NormalizedItem> = eligible
            .into_iter()
            .filter(|item| !updated_by_reference.iter().any(|u| u.id() == item.id()))
            .collect();

        let mut out = rest;
        out.extend(updated_by_reference);
        out.extend(untouched);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_domain::value_objects::{CatalogItemId, Confidence, ProcessingLevel};
    use parking_lot::Mutex;

    struct InMemoryRepo {
        rows: Mutex<Vec<NormalizedItem>>,
    }

    #[async_trait]
    impl NormalizedItemRepository for InMemoryRepo {
        async fn save(&self, item: &NormalizedItem) -> Result<(), CatalogError> {
            let mut rows = self.rows.lock();
            rows.retain(|r| r.id() != item.id());
            rows.push(item.clone());
            Ok(())
        }
        async fn save_batch(&self, items: &[NormalizedItem]) -> Result<(), CatalogError> {
            for item in items {
                self.save(item).await?;
            }
            Ok(())
        }
        async fn find_by_id(&self, id: catalog_domain::value_objects::NormalizedItemId) -> Result<Option<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().find(|r| r.id() == id).cloned())
        }
        async fn find_by_source_item(&self, source_item_id: CatalogItemId) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().filter(|r| r.source_item_id() == source_item_id).cloned().collect())
        }
        async fn find_by_normalized_reference(&self, normalized_reference: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(self.rows.lock().iter().filter(|r| r.normalized_reference() == normalized_reference).cloned().collect())
        }
        async fn find_pending_for_stage(&self, _stage: &str, _batch_size: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(vec![])
        }
        async fn find_all_final(&self, _offset: usize, _limit: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
            Ok(vec![])
        }
        async fn count_final(&self) -> Result<usize, CatalogError> {
            Ok(self.rows.lock().iter().filter(|r| r.is_final()).count())
        }
    }

    fn classified(reference: &str, confidence: f32) -> NormalizedItem {
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "bolt", reference);
        item.classify("25.94.11", "fasteners", Confidence::new(confidence), ProcessingLevel::Enhanced, None)
            .unwrap();
        item.stages_mut().stage8_completed = true;
        item
    }

    #[tokio::test]
    async fn group_members_adopt_highest_confidence_winner() {
        let a = classified("grp-1", 0.6);
        let b = classified("grp-1", 0.9);
        let repo = Arc::new(InMemoryRepo { rows: Mutex::new(vec![a.clone(), b.clone()]) });
        let stage = FinalDecisionStage::new(repo.clone());

        let out = stage.run_batch(vec![a, b]).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| i.is_final()));
        assert!(out.iter().all(|i| i.merged_count() == 2));
        assert!(out.iter().all(|i| i.confidence().value() == 0.9));
    }
}
