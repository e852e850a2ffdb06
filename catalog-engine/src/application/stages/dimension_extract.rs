//! # Dimension Extract Stage
//!
//! Deterministic regex-based extraction of size/unit pairs embedded in
//! the item name (spec.md §4.1 step 7), e.g. `10x30`, `М10х30`, `2.5 мм`.
//! Parsed pairs are JSON-encoded onto the row for the similarity
//! candidate's attribute-overlap component and for algorithmic classify.

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{StageOutcome, StageService};

static DIMENSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*[x×х]\s*(\d+(?:[.,]\d+)?)(?:\s*[x×х]\s*(\d+(?:[.,]\d+)?))?")
        .unwrap()
});

static UNIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?)\s*(мм|см|м|кг|г|л|mm|cm|m|kg|g|l)\b").unwrap());

pub struct DimensionExtractStage;

#[async_trait]
impl StageService for DimensionExtractStage {
    fn name(&self) -> &'static str {
        "stage5_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage4_completed && !item.stages().stage5_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let mut dimensions: Vec<(String, String)> = Vec::new();

        if let Some(caps) = DIMENSION_PATTERN.captures(item.normalized_name()) {
            for (i, group) in caps.iter().enumerate().skip(1) {
                if let Some(matched) = group {
                    dimensions.push((format!("dim{i}"), matched.as_str().to_string()));
                }
            }
        }
        if let Some(caps) = UNIT_PATTERN.captures(item.normalized_name()) {
            dimensions.push(("size".to_string(), caps[1].to_string()));
            dimensions.push(("unit".to_string(), caps[2].to_string()));
        }

        if !dimensions.is_empty() {
            match serde_json::to_string(&dimensions) {
                Ok(json) => item.stages_mut().dimensions_json = Some(json),
                Err(err) => {
                    item.record_error(err.to_string());
                    item.stages_mut().stage5_completed = true;
                    item.stages_mut().stage5_at = Some(Utc::now());
                    return StageOutcome::Errored { item, message: err.to_string() };
                }
            }
        }

        item.stages_mut().stage5_completed = true;
        item.stages_mut().stage5_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_domain::value_objects::CatalogItemId;

    #[tokio::test]
    async fn extracts_size_and_unit() {
        let stage = DimensionExtractStage;
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "кабель 2.5 мм", "A1");
        item.stages_mut().stage4_completed = true;
        let outcome = stage.apply(item).await;
        match outcome {
            StageOutcome::Advanced(item) => assert!(item.stages().dimensions_json.is_some()),
            StageOutcome::Errored { .. } => panic!("expected advance"),
        }
    }

    #[tokio::test]
    async fn absence_of_dimensions_is_not_an_error() {
        let stage = DimensionExtractStage;
        let mut item = NormalizedItem::new(CatalogItemId::new(), "A1", "ключ разводной", "A1");
        item.stages_mut().stage4_completed = true;
        let outcome = stage.apply(item).await;
        match outcome {
            StageOutcome::Advanced(item) => assert!(item.stages().dimensions_json.is_none()),
            StageOutcome::Errored { .. } => panic!("expected advance"),
        }
    }
}
