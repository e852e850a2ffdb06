//! # Group Stage
//!
//! Computes each item's fingerprint (spec.md §4.1 step 5, §4.2) over its
//! lower-cased name and extracted attributes, and uses it as both the
//! `stage3_group_id` audit field and the `normalized_reference` group key
//! that `merged_count` and every later stage's group lookups key off of.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{FingerprintService, StageOutcome, StageService};

pub struct GroupStage {
    fingerprints: Arc<dyn FingerprintService>,
}

impl GroupStage {
    pub fn new(fingerprints: Arc<dyn FingerprintService>) -> Self {
        Self { fingerprints }
    }

    fn attributes(item: &NormalizedItem) -> Vec<(String, String)> {
        item.stages()
            .extracted_attributes_json
            .as_deref()
            .and_then(|json| serde_json::from_str::<std::collections::HashMap<String, String>>(json).ok())
            .map(|map| {
                let mut pairs: Vec<_> = map.into_iter().collect();
                pairs.sort();
                pairs
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl StageService for GroupStage {
    fn name(&self) -> &'static str {
        "stage3_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage25_completed && !item.stages().stage3_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let attributes = Self::attributes(&item);
        let fingerprint = self.fingerprints.compute(item.normalized_name(), &attributes);

        item.stages_mut().stage3_group_id = Some(fingerprint.as_str().to_string());
        item.set_normalized_reference(fingerprint.as_str());
        item.stages_mut().stage3_completed = true;
        item.stages_mut().stage3_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}
