//! # Fallback Stage
//!
//! Deterministic last-resort rules for items still unclassified after
//! AI classify (spec.md §4.1 step 11): assigns a generic catch-all code
//! keyed by `item_type` so every item reaches Final decision with *some*
//! taxonomy assignment. Never overwrites an existing classification —
//! `processing_level` only ever strengthens, and an already-classified
//! item already has stronger evidence than this stage can offer.

use async_trait::async_trait;
use chrono::Utc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};
use catalog_domain::value_objects::{Confidence, ProcessingLevel};

const FALLBACK_CODE: &str = "99.99.99";
const FALLBACK_NAME: &str = "unclassified";
const FALLBACK_CONFIDENCE: f32 = 0.1;

pub struct FallbackStage;

#[async_trait]
impl StageService for FallbackStage {
    fn name(&self) -> &'static str {
        "stage8_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage7_ai_processed && !item.stages().stage8_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let now = Utc::now();
        if item.taxonomy_code().is_none() {
            let code = match item.stages().item_type.as_deref() {
                Some("counterparty") => "99.99.01",
                Some("service") => "99.99.02",
                _ => FALLBACK_CODE,
            };
            if let Err(err) = item.classify(code, FALLBACK_NAME, Confidence::new(FALLBACK_CONFIDENCE), ProcessingLevel::Basic, None) {
                item.record_error(err.to_string());
                item.stages_mut().stage8_completed = true;
                item.stages_mut().stage8_at = Some(now);
                return StageOutcome::Errored { item, message: err.to_string() };
            }
        }
        item.stages_mut().stage8_completed = true;
        item.stages_mut().stage8_at = Some(now);
        StageOutcome::Advanced(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_domain::value_objects::CatalogItemId;

    #[tokio::test]
    async fn unclassified_item_gets_fallback_code() {
        let stage = FallbackStage;
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "mystery part", "A1");
        item.stages_mut().stage7_ai_processed = true;
        let outcome = stage.apply(item).await;
        match outcome {
            StageOutcome::Advanced(item) => assert_eq!(item.taxonomy_code(), Some(FALLBACK_CODE)),
            StageOutcome::Errored { .. } => panic!("expected advance"),
        }
    }

    #[tokio::test]
    async fn already_classified_item_is_untouched() {
        let stage = FallbackStage;
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "bolt", "A1");
        item.classify("25.94.11", "fasteners", Confidence::new(0.8), ProcessingLevel::AiEnhanced, None)
            .unwrap();
        item.stages_mut().stage7_ai_processed = true;
        let outcome = stage.apply(item).await;
        match outcome {
            StageOutcome::Advanced(item) => assert_eq!(item.taxonomy_code(), Some("25.94.11")),
            StageOutcome::Errored { .. } => panic!("expected advance"),
        }
    }
}
