//! # Snapshot Repository Interface

use async_trait::async_trait;

use crate::entities::Snapshot;
use crate::error::CatalogError;
use crate::value_objects::SnapshotId;

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Persists the snapshot and its memberships atomically — readers
    /// must observe either the full snapshot or no snapshot (spec.md §5).
    async fn save_atomic(&self, snapshot: &Snapshot) -> Result<(), CatalogError>;

    async fn find_by_id(&self, id: SnapshotId) -> Result<Option<Snapshot>, CatalogError>;

    async fn find_by_project(&self, project_ref: &str) -> Result<Vec<Snapshot>, CatalogError>;
}
