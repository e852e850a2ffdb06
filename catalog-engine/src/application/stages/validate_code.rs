//! # Validate Code Stage
//!
//! Rejects taxonomy codes that do not exist in `ClassifierNode` (spec.md
//! §4.1 step 9). An item with no candidate code yet (algorithmic classify
//! found nothing) simply passes through.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::repositories::ClassifierRepository;
use catalog_domain::services::{StageOutcome, StageService};

pub struct ValidateCodeStage {
    classifier: Arc<dyn ClassifierRepository>,
}

impl ValidateCodeStage {
    pub fn new(classifier: Arc<dyn ClassifierRepository>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl StageService for ValidateCodeStage {
    fn name(&self) -> &'static str {
        "stage65_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage6_completed && !item.stages().stage65_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        if let Some(code) = item.taxonomy_code().map(str::to_string) {
            match self.classifier.find_by_code(&code).await {
                Ok(None) => item.invalidate_classification(),
                Ok(Some(_)) => {}
                Err(err) => {
                    item.record_error(err.to_string());
                    item.stages_mut().stage65_completed = true;
                    item.stages_mut().stage65_at = Some(Utc::now());
                    return StageOutcome::Errored { item, message: err.to_string() };
                }
            }
        }
        item.stages_mut().stage65_completed = true;
        item.stages_mut().stage65_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}
