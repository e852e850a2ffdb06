//! # CatalogItem Repository Interface

use async_trait::async_trait;

use crate::entities::CatalogItem;
use crate::error::CatalogError;
use crate::value_objects::{CatalogItemId, UploadId};

#[async_trait]
pub trait CatalogItemRepository: Send + Sync {
    /// Idempotent on (upload_id, external_reference) per spec.md §6: a
    /// repeated post with the same pair is a no-op, not a duplicate row.
    async fn save(&self, item: &CatalogItem) -> Result<(), CatalogError>;

    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, CatalogError>;

    async fn find_by_upload(&self, upload_id: UploadId) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Items in `upload_id` whose normalized row has not reached the given
    /// stage yet — the pipeline engine's per-stage work queue. `stage` is
    /// the full `StageFlags` field name (e.g. `"stage05_completed"`,
    /// `"stage7_ai_processed"`, `"final_completed"`).
    async fn find_pending_for_stage(
        &self,
        upload_id: UploadId,
        stage: &str,
        batch_size: usize,
    ) -> Result<Vec<CatalogItem>, CatalogError>;

    async fn count_by_upload(&self, upload_id: UploadId) -> Result<usize, CatalogError>;
}
