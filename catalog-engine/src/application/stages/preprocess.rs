//! # Preprocess Stage
//!
//! First stage in the pipeline (spec.md §4.1 step 1): trims whitespace,
//! strips control characters, and rejects empty names. Runs on a
//! `NormalizedItem` that the engine bootstraps with the source item's raw
//! name before this stage ever sees it.

use async_trait::async_trait;
use chrono::Utc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};

pub struct PreprocessStage;

fn strip_control_chars(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}

#[async_trait]
impl StageService for PreprocessStage {
    fn name(&self) -> &'static str {
        "stage05_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        !item.stages().stage05_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let cleaned = strip_control_chars(item.normalized_name().trim());
        item.set_normalized_name(cleaned.clone());

        let now = Utc::now();
        item.stages_mut().stage05_completed = true;
        item.stages_mut().stage05_at = Some(now);

        if cleaned.is_empty() {
            item.record_error("empty name after preprocessing");
            return StageOutcome::Errored {
                item,
                message: "empty name after preprocessing".to_string(),
            };
        }
        StageOutcome::Advanced(item)
    }
}
