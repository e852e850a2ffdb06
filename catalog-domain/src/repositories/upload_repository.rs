//! # Upload Repository Interface

use async_trait::async_trait;

use crate::entities::Upload;
use crate::error::CatalogError;
use crate::value_objects::UploadId;

#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn save(&self, upload: &Upload) -> Result<(), CatalogError>;
    async fn find_by_id(&self, id: UploadId) -> Result<Option<Upload>, CatalogError>;
    async fn update(&self, upload: &Upload) -> Result<(), CatalogError>;

    /// Paginated, ordered by start time descending, per spec.md §6.
    async fn list_paginated(&self, offset: usize, limit: usize) -> Result<Vec<Upload>, CatalogError>;

    async fn count(&self) -> Result<usize, CatalogError>;
}
