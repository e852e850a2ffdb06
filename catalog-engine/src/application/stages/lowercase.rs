//! # Lowercase Stage
//!
//! Canonical case fold (spec.md §4.1 step 2). Unicode-aware so Cyrillic
//! and Latin names both normalize correctly.

use async_trait::async_trait;
use chrono::Utc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};

pub struct LowercaseStage;

#[async_trait]
impl StageService for LowercaseStage {
    fn name(&self) -> &'static str {
        "stage1_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage05_completed && !item.stages().stage1_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        item.set_normalized_name(item.normalized_name().to_lowercase());
        item.stages_mut().stage1_completed = true;
        item.stages_mut().stage1_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}
