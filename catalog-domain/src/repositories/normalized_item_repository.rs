//! # NormalizedItem Repository Interface

use async_trait::async_trait;

use crate::entities::NormalizedItem;
use crate::error::CatalogError;
use crate::value_objects::{CatalogItemId, NormalizedItemId};

#[async_trait]
pub trait NormalizedItemRepository: Send + Sync {
    async fn save(&self, item: &NormalizedItem) -> Result<(), CatalogError>;
    async fn save_batch(&self, items: &[NormalizedItem]) -> Result<(), CatalogError>;

    async fn find_by_id(&self, id: NormalizedItemId) -> Result<Option<NormalizedItem>, CatalogError>;
    async fn find_by_source_item(
        &self,
        source_item_id: CatalogItemId,
    ) -> Result<Vec<NormalizedItem>, CatalogError>;

    /// All rows sharing a `normalized_reference` — a normalized group.
    async fn find_by_normalized_reference(
        &self,
        normalized_reference: &str,
    ) -> Result<Vec<NormalizedItem>, CatalogError>;

    /// Rows whose flag named by `stage` is not yet set. `stage` is the full
    /// `StageFlags` field name (e.g. `"stage05_completed"`,
    /// `"stage7_ai_processed"`, `"final_completed"`).
    async fn find_pending_for_stage(
        &self,
        stage: &str,
        batch_size: usize,
    ) -> Result<Vec<NormalizedItem>, CatalogError>;

    async fn find_all_final(&self, offset: usize, limit: usize) -> Result<Vec<NormalizedItem>, CatalogError>;

    async fn count_final(&self) -> Result<usize, CatalogError>;
}
