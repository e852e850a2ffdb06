//! # In-Process Ingest Gateway
//!
//! Implements `IngestGateway` directly against `UploadRepository` /
//! `CatalogItemRepository`, standing in for the HTTP transport spec.md §1
//! places out of scope. Sufficient for the admin CLI's `ingest replay`
//! command and for integration tests to exercise the §6 contract
//! (handshake, idempotent item posts, complete-then-reject).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use catalog_domain::entities::{CatalogItem, Upload};
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{CatalogItemRepository, UploadRepository};
use catalog_domain::services::{IngestGateway, IngestItemRecord};
use catalog_domain::value_objects::UploadId;

pub struct InProcessIngestGateway {
    uploads: Arc<dyn UploadRepository>,
    catalog_items: Arc<dyn CatalogItemRepository>,
}

impl InProcessIngestGateway {
    pub fn new(uploads: Arc<dyn UploadRepository>, catalog_items: Arc<dyn CatalogItemRepository>) -> Self {
        Self { uploads, catalog_items }
    }

    async fn load_in_progress(&self, upload_id: UploadId) -> Result<Upload, CatalogError> {
        let upload = self
            .uploads
            .find_by_id(upload_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("upload {upload_id}")))?;
        if upload.is_complete() {
            return Err(CatalogError::validation(format!("upload {upload_id} is already complete")));
        }
        Ok(upload)
    }
}

#[async_trait]
impl IngestGateway for InProcessIngestGateway {
    async fn handshake(&self, version: &str, config_name: &str, at: DateTime<Utc>) -> Result<UploadId, CatalogError> {
        tracing::info!(version, config_name, "ingest handshake");
        let upload = Upload::handshake(at);
        let id = upload.id();
        self.uploads.save(&upload).await?;
        Ok(id)
    }

    async fn submit_item(
        &self,
        upload_id: UploadId,
        record: IngestItemRecord,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        let mut upload = self.load_in_progress(upload_id).await?;
        let item = CatalogItem::new(
            upload_id,
            record.external_reference,
            record.external_code,
            record.raw_name,
            record.attributes,
            record.table_parts,
            at,
        );
        // Idempotent on (upload_id, external_reference): the repository
        // adapter upserts rather than duplicate-inserting.
        self.catalog_items.save(&item).await?;
        upload.record_item()?;
        self.uploads.update(&upload).await
    }

    async fn record_constant(&self, upload_id: UploadId) -> Result<(), CatalogError> {
        let mut upload = self.load_in_progress(upload_id).await?;
        upload.record_constant()?;
        self.uploads.update(&upload).await
    }

    async fn record_catalog(&self, upload_id: UploadId) -> Result<(), CatalogError> {
        let mut upload = self.load_in_progress(upload_id).await?;
        upload.record_catalog()?;
        self.uploads.update(&upload).await
    }

    async fn complete(&self, upload_id: UploadId, at: DateTime<Utc>) -> Result<(), CatalogError> {
        let mut upload = self.load_in_progress(upload_id).await?;
        upload.complete(at)?;
        self.uploads.update(&upload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap as StdMap;

    #[derive(Default)]
    struct InMemoryUploads(Mutex<StdMap<UploadId, Upload>>);

    #[async_trait]
    impl UploadRepository for InMemoryUploads {
        async fn save(&self, upload: &Upload) -> Result<(), CatalogError> {
            self.0.lock().insert(upload.id(), upload.clone());
            Ok(())
        }
        async fn find_by_id(&self, id: UploadId) -> Result<Option<Upload>, CatalogError> {
            Ok(self.0.lock().get(&id).cloned())
        }
        async fn update(&self, upload: &Upload) -> Result<(), CatalogError> {
            self.0.lock().insert(upload.id(), upload.clone());
            Ok(())
        }
        async fn list_paginated(&self, _offset: usize, _limit: usize) -> Result<Vec<Upload>, CatalogError> {
            Ok(self.0.lock().values().cloned().collect())
        }
        async fn count(&self) -> Result<usize, CatalogError> {
            Ok(self.0.lock().len())
        }
    }

    #[derive(Default)]
    struct InMemoryItems(Mutex<Vec<CatalogItem>>);

    #[async_trait]
    impl CatalogItemRepository for InMemoryItems {
        async fn save(&self, item: &CatalogItem) -> Result<(), CatalogError> {
            let mut items = self.0.lock();
            if let Some(existing) = items
                .iter_mut()
                .find(|existing| existing.upload_id() == item.upload_id() && existing.external_reference() == item.external_reference())
            {
                *existing = item.clone();
            } else {
                items.push(item.clone());
            }
            Ok(())
        }
        async fn find_by_id(&self, id: catalog_domain::value_objects::CatalogItemId) -> Result<Option<CatalogItem>, CatalogError> {
            Ok(self.0.lock().iter().find(|item| item.id() == id).cloned())
        }
        async fn find_by_upload(&self, upload_id: UploadId) -> Result<Vec<CatalogItem>, CatalogError> {
            Ok(self.0.lock().iter().filter(|item| item.upload_id() == upload_id).cloned().collect())
        }
        async fn find_pending_for_stage(
            &self,
            _upload_id: UploadId,
            _stage: &str,
            _batch_size: usize,
        ) -> Result<Vec<CatalogItem>, CatalogError> {
            Ok(Vec::new())
        }
        async fn count_by_upload(&self, upload_id: UploadId) -> Result<usize, CatalogError> {
            Ok(self.0.lock().iter().filter(|item| item.upload_id() == upload_id).count())
        }
    }

    fn gateway() -> InProcessIngestGateway {
        InProcessIngestGateway::new(Arc::new(InMemoryUploads::default()), Arc::new(InMemoryItems::default()))
    }

    #[tokio::test]
    async fn handshake_then_submit_then_complete() {
        let gateway = gateway();
        let now = Utc::now();
        let upload_id = gateway.handshake("1.0", "default", now).await.unwrap();

        gateway
            .submit_item(
                upload_id,
                IngestItemRecord {
                    external_reference: "ext-1".to_string(),
                    external_code: None,
                    raw_name: "Болт М10".to_string(),
                    attributes: Default::default(),
                    table_parts: serde_json::Value::Null,
                },
                now,
            )
            .await
            .unwrap();

        gateway.complete(upload_id, now).await.unwrap();

        let err = gateway
            .submit_item(
                upload_id,
                IngestItemRecord {
                    external_reference: "ext-2".to_string(),
                    external_code: None,
                    raw_name: "late item".to_string(),
                    attributes: Default::default(),
                    table_parts: serde_json::Value::Null,
                },
                now,
            )
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn submitting_same_reference_twice_is_idempotent() {
        let gateway = gateway();
        let now = Utc::now();
        let upload_id = gateway.handshake("1.0", "default", now).await.unwrap();
        let record = || IngestItemRecord {
            external_reference: "ext-1".to_string(),
            external_code: None,
            raw_name: "item".to_string(),
            attributes: Default::default(),
            table_parts: serde_json::Value::Null,
        };
        gateway.submit_item(upload_id, record(), now).await.unwrap();
        gateway.submit_item(upload_id, record(), now).await.unwrap();
    }
}
