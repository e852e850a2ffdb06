//! # Type Detect Stage
//!
//! Classifies each item as `good`, `service`, or `counterparty` via
//! deterministic keyword rules (spec.md §4.1 step 3). The result routes
//! later stages: only `good` rows proceed through article/dimension
//! extraction and classification in any meaningful way, but every item
//! still advances through the same stage sequence per the "stages
//! advance in lockstep" policy in §4.1.

use async_trait::async_trait;
use chrono::Utc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};

const SERVICE_KEYWORDS: [&str; 8] = [
    "услуга", "ремонт", "обслуживание", "монтаж", "доставка", "service", "repair", "installation",
];

const COUNTERPARTY_KEYWORDS: [&str; 10] = [
    "ооо", "зао", "оао", "пао", "ип ", "llc", "ltd", "inc", "корпорация", "gmbh",
];

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| name.contains(kw))
}

pub struct TypeDetectStage;

#[async_trait]
impl StageService for TypeDetectStage {
    fn name(&self) -> &'static str {
        "stage2_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage1_completed && !item.stages().stage2_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let name = item.normalized_name();
        let item_type = if contains_any(name, &COUNTERPARTY_KEYWORDS) {
            "counterparty"
        } else if contains_any(name, &SERVICE_KEYWORDS) {
            "service"
        } else {
            "good"
        };
        item.stages_mut().item_type = Some(item_type.to_string());
        item.stages_mut().stage2_completed = true;
        item.stages_mut().stage2_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}
