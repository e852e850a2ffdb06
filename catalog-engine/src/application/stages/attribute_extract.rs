//! # Attribute Extract Stage
//!
//! Loads the source `CatalogItem`'s structured attribute map (spec.md §4.1
//! step 4) and caches it as JSON on the `NormalizedItem` row so later
//! stages (dimension extract, the similarity candidate builder) don't
//! repeatedly round-trip to `CatalogItemRepository`.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::repositories::CatalogItemRepository;
use catalog_domain::services::{StageOutcome, StageService};

pub struct AttributeExtractStage {
    catalog_items: Arc<dyn CatalogItemRepository>,
}

impl AttributeExtractStage {
    pub fn new(catalog_items: Arc<dyn CatalogItemRepository>) -> Self {
        Self { catalog_items }
    }
}

#[async_trait]
impl StageService for AttributeExtractStage {
    fn name(&self) -> &'static str {
        "stage25_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        item.stages().stage2_completed && !item.stages().stage25_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        let source = match self.catalog_items.find_by_id(item.source_item_id()).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                item.record_error("source catalog item missing");
                return StageOutcome::Errored {
                    item,
                    message: "source catalog item missing".to_string(),
                };
            }
            Err(err) => {
                item.record_error(err.to_string());
                return StageOutcome::Errored { item, message: err.to_string() };
            }
        };

        match serde_json::to_string(source.attributes()) {
            Ok(json) => {
                item.stages_mut().extracted_attributes_json = Some(json);
                item.stages_mut().stage25_completed = true;
                item.stages_mut().stage25_at = Some(Utc::now());
                StageOutcome::Advanced(item)
            }
            Err(err) => {
                item.record_error(err.to_string());
                StageOutcome::Errored { item, message: err.to_string() }
            }
        }
    }
}
