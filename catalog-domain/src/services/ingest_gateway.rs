//! # Ingest Gateway
//!
//! Trait-level contract for spec.md §6's ingest surface (handshake,
//! metadata/constant/catalog-item posts, complete). The HTTP transport is
//! out of scope; this is the seam an in-process adapter or, eventually, a
//! thin HTTP handler sits behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::CatalogError;
use crate::value_objects::UploadId;

/// One posted catalog item, exactly as the external system sends it —
/// preserved verbatim per §6 ("the service preserves the attribute
/// payload verbatim in the store").
#[derive(Debug, Clone)]
pub struct IngestItemRecord {
    pub external_reference: String,
    pub external_code: Option<String>,
    pub raw_name: String,
    pub attributes: HashMap<String, String>,
    pub table_parts: serde_json::Value,
}

#[async_trait]
pub trait IngestGateway: Send + Sync {
    /// Opens a new upload, returning its freshly generated id.
    async fn handshake(&self, version: &str, config_name: &str, at: DateTime<Utc>) -> Result<UploadId, CatalogError>;

    /// Idempotent on `(upload_id, external_reference)`.
    async fn submit_item(
        &self,
        upload_id: UploadId,
        record: IngestItemRecord,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError>;

    async fn record_constant(&self, upload_id: UploadId) -> Result<(), CatalogError>;

    async fn record_catalog(&self, upload_id: UploadId) -> Result<(), CatalogError>;

    /// Closes the upload. Further `submit_item` calls for this id are
    /// rejected thereafter.
    async fn complete(&self, upload_id: UploadId, at: DateTime<Utc>) -> Result<(), CatalogError>;
}
