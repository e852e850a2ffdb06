//! # AI Classify Stage
//!
//! For items whose algorithmic confidence is below
//! `kpved_start_threshold`, delegates to the hierarchical classifier
//! (spec.md §4.1 step 10, §4.4), which itself checks the benchmark
//! finder before making any orchestrator call. Items that are already
//! confident enough pass through untouched — `processing_level` never
//! regresses, so a skip here is not a downgrade.
//!
//! Orchestrator failures (`AllProvidersFailed`, `NoCapacity`,
//! `CircuitOpen`, ...) are item-level errors, not stage failures: they
//! are recorded on `last_error` and the item still advances to the next
//! stage, to be picked up by Fallback.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};
use catalog_domain::value_objects::{Confidence, ProcessingLevel};

use crate::application::classifier::HierarchicalClassifier;

pub struct AiClassifyStage {
    classifier: Arc<HierarchicalClassifier>,
    cancel: CancellationToken,
    start_threshold: f32,
}

impl AiClassifyStage {
    pub fn new(classifier: Arc<HierarchicalClassifier>, cancel: CancellationToken, start_threshold: f32) -> Self {
        Self { classifier, cancel, start_threshold }
    }
}

#[async_trait]
impl StageService for AiClassifyStage {
    fn name(&self) -> &'static str {
        "stage7_ai_processed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage65_completed && !item.stages().stage7_ai_processed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let now = Utc::now();

        if self.cancel.is_cancelled() {
            item.stages_mut().stage7_ai_processed = true;
            item.stages_mut().stage7_at = Some(now);
            return StageOutcome::Advanced(item);
        }

        if item.confidence().meets(Confidence::new(self.start_threshold)) {
            item.stages_mut().stage7_ai_processed = true;
            item.stages_mut().stage7_at = Some(now);
            return StageOutcome::Advanced(item);
        }

        match self.classifier.classify(item.normalized_name(), self.cancel.clone()).await {
            Ok(outcome) => {
                if let Some(code) = outcome.final_code {
                    let level = if outcome.benchmark_short_circuit {
                        ProcessingLevel::Benchmark
                    } else {
                        ProcessingLevel::AiEnhanced
                    };
                    let name = outcome.final_name.unwrap_or_else(|| code.clone());
                    let reasoning = (!outcome.steps.is_empty())
                        .then(|| format!("hierarchical walk: {} step(s)", outcome.steps.len()));
                    if let Err(err) = item.classify(code, name, Confidence::new(outcome.final_confidence), level, reasoning) {
                        item.record_error(err.to_string());
                    }
                }
                item.stages_mut().stage7_ai_processed = true;
                item.stages_mut().stage7_at = Some(now);
                StageOutcome::Advanced(item)
            }
            Err(err) => {
                item.record_error(err.to_string());
                item.stages_mut().stage7_ai_processed = true;
                item.stages_mut().stage7_at = Some(now);
                StageOutcome::Errored { item, message: err.to_string() }
            }
        }
    }
}
