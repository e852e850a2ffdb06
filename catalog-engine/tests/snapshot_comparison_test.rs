// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage of the snapshot-comparison scenario: the same
//! normalized group reclassified with a different code between two
//! uploads must show up in `changed` with the before/after codes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use catalog_domain::entities::{CatalogItem, NormalizedItem, Snapshot, Upload};
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{CatalogItemRepository, NormalizedItemRepository, SnapshotRepository, UploadRepository};
use catalog_domain::value_objects::{CatalogItemId, Confidence, NormalizedItemId, ProcessingLevel, SnapshotId, UploadId};

use catalog_engine::application::snapshot::SnapshotEngine;

#[derive(Default)]
struct InMemoryUploads {
    rows: Mutex<Vec<Upload>>,
}

#[async_trait]
impl UploadRepository for InMemoryUploads {
    async fn save(&self, upload: &Upload) -> Result<(), CatalogError> {
        self.rows.lock().push(upload.clone());
        Ok(())
    }
    async fn find_by_id(&self, id: UploadId) -> Result<Option<Upload>, CatalogError> {
        Ok(self.rows.lock().iter().find(|u| u.id() == id).cloned())
    }
    async fn update(&self, upload: &Upload) -> Result<(), CatalogError> {
        let mut rows = self.rows.lock();
        rows.retain(|u| u.id() != upload.id());
        rows.push(upload.clone());
        Ok(())
    }
    async fn list_paginated(&self, offset: usize, limit: usize) -> Result<Vec<Upload>, CatalogError> {
        Ok(self.rows.lock().iter().skip(offset).take(limit).cloned().collect())
    }
    async fn count(&self) -> Result<usize, CatalogError> {
        Ok(self.rows.lock().len())
    }
}

#[derive(Default)]
struct InMemoryCatalogItems {
    rows: Mutex<Vec<CatalogItem>>,
}

#[async_trait]
impl CatalogItemRepository for InMemoryCatalogItems {
    async fn save(&self, item: &CatalogItem) -> Result<(), CatalogError> {
        self.rows.lock().push(item.clone());
        Ok(())
    }
    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, CatalogError> {
        Ok(self.rows.lock().iter().find(|i| i.id() == id).cloned())
    }
    async fn find_by_upload(&self, upload_id: UploadId) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.rows.lock().iter().filter(|i| i.upload_id() == upload_id).cloned().collect())
    }
    async fn find_pending_for_stage(&self, _upload_id: UploadId, _stage: &str, _batch_size: usize) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(Vec::new())
    }
    async fn count_by_upload(&self, upload_id: UploadId) -> Result<usize, CatalogError> {
        Ok(self.rows.lock().iter().filter(|i| i.upload_id() == upload_id).count())
    }
}

#[derive(Default)]
struct InMemoryNormalizedItems {
    rows: Mutex<Vec<NormalizedItem>>,
}

#[async_trait]
impl NormalizedItemRepository for InMemoryNormalizedItems {
    async fn save(&self, item: &NormalizedItem) -> Result<(), CatalogError> {
        self.rows.lock().push(item.clone());
        Ok(())
    }
    async fn save_batch(&self, items: &[NormalizedItem]) -> Result<(), CatalogError> {
        for item in items {
            self.save(item).await?;
        }
        Ok(())
    }
    async fn find_by_id(&self, id: NormalizedItemId) -> Result<Option<NormalizedItem>, CatalogError> {
        Ok(self.rows.lock().iter().find(|r| r.id() == id).cloned())
    }
    async fn find_by_source_item(&self, source_item_id: CatalogItemId) -> Result<Vec<NormalizedItem>, CatalogError> {
        Ok(self.rows.lock().iter().filter(|r| r.source_item_id() == source_item_id).cloned().collect())
    }
    async fn find_by_normalized_reference(&self, normalized_reference: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
        Ok(self.rows.lock().iter().filter(|r| r.normalized_reference() == normalized_reference).cloned().collect())
    }
    async fn find_pending_for_stage(&self, _stage: &str, _batch_size: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
        Ok(Vec::new())
    }
    async fn find_all_final(&self, offset: usize, limit: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
        Ok(self.rows.lock().iter().skip(offset).take(limit).cloned().collect())
    }
    async fn count_final(&self) -> Result<usize, CatalogError> {
        Ok(self.rows.lock().len())
    }
}

#[derive(Default)]
struct InMemorySnapshots {
    rows: Mutex<Vec<Snapshot>>,
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshots {
    async fn save_atomic(&self, snapshot: &Snapshot) -> Result<(), CatalogError> {
        self.rows.lock().push(snapshot.clone());
        Ok(())
    }
    async fn find_by_id(&self, id: SnapshotId) -> Result<Option<Snapshot>, CatalogError> {
        Ok(self.rows.lock().iter().find(|s| s.id() == id).cloned())
    }
    async fn find_by_project(&self, project_ref: &str) -> Result<Vec<Snapshot>, CatalogError> {
        Ok(self.rows.lock().iter().filter(|s| s.project_ref() == project_ref).cloned().collect())
    }
}

/// Seeds one completed upload holding a single source item whose
/// normalized row is the group `reference` classified at `code`.
async fn seed_upload(
    uploads: &InMemoryUploads,
    catalog_items: &InMemoryCatalogItems,
    normalized_items: &InMemoryNormalizedItems,
    at: DateTime<Utc>,
    reference: &str,
    code: &str,
) -> UploadId {
    let mut upload = Upload::handshake(at);
    upload.complete(at).unwrap();
    uploads.save(&upload).await.unwrap();

    let source = CatalogItem::new(
        upload.id(),
        format!("ext-{reference}"),
        None,
        reference.to_string(),
        Default::default(),
        serde_json::Value::Null,
        at,
    );
    catalog_items.save(&source).await.unwrap();

    let mut normalized = NormalizedItem::new(source.id(), reference, reference, reference);
    normalized.classify(code, reference, Confidence::new(0.9), ProcessingLevel::Enhanced, None).unwrap();
    normalized_items.save(&normalized).await.unwrap();

    upload.id()
}

#[tokio::test]
async fn reclassified_group_between_uploads_shows_up_as_changed() {
    let uploads = Arc::new(InMemoryUploads::default());
    let catalog_items = Arc::new(InMemoryCatalogItems::default());
    let normalized_items = Arc::new(InMemoryNormalizedItems::default());
    let snapshots = Arc::new(InMemorySnapshots::default());
    let engine = SnapshotEngine::new(snapshots, uploads.clone(), catalog_items.clone(), normalized_items.clone());

    let group = "кабель ввг 3х2.5";
    let t0 = Utc::now();
    let t1 = t0 + chrono::Duration::hours(1);
    let u1 = seed_upload(&uploads, &catalog_items, &normalized_items, t0, group, "X").await;
    let u2 = seed_upload(&uploads, &catalog_items, &normalized_items, t1, group, "Y").await;

    let snapshot = engine
        .create_snapshot("comparison", None, "acme", None, vec![u1, u2], Utc::now())
        .await
        .unwrap();

    let diffs = engine.compare(snapshot.id()).await.unwrap();
    assert_eq!(diffs.len(), 1, "two uploads produce exactly one consecutive-iteration diff");
    let diff = &diffs[0];
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert_eq!(diff.changed, vec![group.to_string()]);

    let iterations: Vec<(u32, Vec<NormalizedItem>)> = {
        let metrics = engine.metrics(snapshot.id()).await.unwrap();
        assert_eq!(metrics.len(), 2);
        Vec::new()
    };
    let _ = iterations;

    let evolution = engine.evolution(snapshot.id()).await.unwrap();
    let trail = evolution.get(group).expect("group tracked across both iterations");
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].code.as_deref(), Some("X"));
    assert_eq!(trail[1].code.as_deref(), Some("Y"));
}

#[tokio::test]
async fn comparing_an_iteration_to_itself_yields_empty_diff() {
    let uploads = Arc::new(InMemoryUploads::default());
    let catalog_items = Arc::new(InMemoryCatalogItems::default());
    let normalized_items = Arc::new(InMemoryNormalizedItems::default());
    let snapshots = Arc::new(InMemorySnapshots::default());
    let engine = SnapshotEngine::new(snapshots, uploads.clone(), catalog_items.clone(), normalized_items.clone());

    let u1 = seed_upload(&uploads, &catalog_items, &normalized_items, Utc::now(), "болт м10", "25.94.11").await;
    let snapshot = engine
        .create_snapshot("self-compare", None, "acme", None, vec![u1, u1], Utc::now())
        .await
        .unwrap();

    let diffs = engine.compare(snapshot.id()).await.unwrap();
    assert_eq!(diffs.len(), 1);
    assert!(diffs[0].added.is_empty());
    assert!(diffs[0].removed.is_empty());
    assert!(diffs[0].changed.is_empty());
}
