//! # Classifier Repository Interface

use async_trait::async_trait;

use crate::entities::ClassifierNode;
use crate::error::CatalogError;

#[async_trait]
pub trait ClassifierRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<ClassifierNode>, CatalogError>;

    /// Direct children of `parent_code` (roots when `parent_code` is
    /// `None`), limited per spec.md §4.4 (≤ 20 per level, enforced by the
    /// caller).
    async fn children(&self, parent_code: Option<&str>) -> Result<Vec<ClassifierNode>, CatalogError>;

    async fn save(&self, node: &ClassifierNode) -> Result<(), CatalogError>;

    /// Verifies every node's `parent_code` resolves to a node one level
    /// up, or is null at level 1 — spec.md §3/§8 invariant.
    async fn validate_tree(&self) -> Result<(), CatalogError>;
}
