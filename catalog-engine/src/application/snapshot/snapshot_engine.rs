//! # Snapshot Engine
//!
//! Freezes a sequence of completed uploads as ordered iterations and
//! compares normalized groups across them (spec.md §4.6). Iteration
//! membership is per-upload; a normalized group's evolution is tracked by
//! `normalized_reference`, so merges and reclassifications between
//! uploads show up as added/removed/changed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use catalog_domain::entities::{NormalizedItem, Snapshot, SnapshotType, Upload};
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{CatalogItemRepository, NormalizedItemRepository, SnapshotRepository, UploadRepository};
use catalog_domain::value_objects::{SnapshotId, UploadId};

#[derive(Debug, Clone, Default)]
pub struct IterationDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EvolutionPoint {
    pub iteration_index: u32,
    pub merged_count: u32,
    pub confidence: f32,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IterationMetrics {
    pub iteration_index: u32,
    pub total_processed: usize,
    pub unique_groups: usize,
    pub avg_confidence: f32,
    pub success_rate: f32,
}

pub struct SnapshotEngine {
    snapshots: Arc<dyn SnapshotRepository>,
    uploads: Arc<dyn UploadRepository>,
    catalog_items: Arc<dyn CatalogItemRepository>,
    normalized_items: Arc<dyn NormalizedItemRepository>,
}

impl SnapshotEngine {
    pub fn new(
        snapshots: Arc<dyn SnapshotRepository>,
        uploads: Arc<dyn UploadRepository>,
        catalog_items: Arc<dyn CatalogItemRepository>,
        normalized_items: Arc<dyn NormalizedItemRepository>,
    ) -> Self {
        Self { snapshots, uploads, catalog_items, normalized_items }
    }

    pub async fn create_snapshot(
        &self,
        name: &str,
        description: Option<String>,
        project_ref: &str,
        client_ref: Option<String>,
        upload_ids: Vec<UploadId>,
        at: DateTime<Utc>,
    ) -> Result<Snapshot, CatalogError> {
        for upload_id in &upload_ids {
            let upload = self
                .uploads
                .find_by_id(*upload_id)
                .await?
                .ok_or_else(|| CatalogError::not_found(format!("upload {upload_id}")))?;
            if !upload.is_complete() {
                return Err(CatalogError::validation(format!("upload {upload_id} is not complete")));
            }
        }
        let snapshot = Snapshot::create(name, description, SnapshotType::Manual, project_ref, client_ref, upload_ids, at)?;
        self.snapshots.save_atomic(&snapshot).await?;
        Ok(snapshot)
    }

    /// Gathers the latest `n` completed uploads for `project_ref`
    /// (oldest to newest by completion time) and creates a snapshot from
    /// them. Scoping uploads to "the project's active database" is the
    /// caller's responsibility, via which `UploadRepository` it injects —
    /// mirroring the project-scoping convention on `CounterpartyRepository`.
    pub async fn auto_snapshot(&self, project_ref: &str, n: usize, at: DateTime<Utc>) -> Result<Snapshot, CatalogError> {
        let candidates = self.uploads.list_paginated(0, usize::MAX / 2).await?;
        let mut completed: Vec<Upload> = candidates.into_iter().filter(Upload::is_complete).collect();
        completed.sort_by_key(|u| u.ended_at().unwrap_or(u.started_at()));
        let start = completed.len().saturating_sub(n);
        let latest: Vec<UploadId> = completed[start..].iter().map(|u| u.id()).collect();
        self.create_snapshot(
            &format!("auto-{}", at.format("%Y%m%dT%H%M%S")),
            Some(format!("latest {n} uploads")),
            project_ref,
            None,
            latest,
            at,
        )
        .await
    }

    async fn iteration_rows(&self, upload_id: UploadId) -> Result<Vec<NormalizedItem>, CatalogError> {
        let mut rows = Vec::new();
        for item in self.catalog_items.find_by_upload(upload_id).await? {
            rows.extend(self.normalized_items.find_by_source_item(item.id()).await?);
        }
        Ok(rows)
    }

    async fn iterations(&self, snapshot_id: SnapshotId) -> Result<Vec<(u32, Vec<NormalizedItem>)>, CatalogError> {
        let snapshot = self
            .snapshots
            .find_by_id(snapshot_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(format!("snapshot {snapshot_id}")))?;

        let mut out = Vec::with_capacity(snapshot.iteration_count());
        for membership in snapshot.memberships() {
            out.push((membership.iteration_index, self.iteration_rows(membership.upload_id).await?));
        }
        out.sort_by_key(|(idx, _)| *idx);
        Ok(out)
    }

    /// Computes {added, removed, changed} between every pair of
    /// consecutive iterations, keyed by `normalized_reference`.
    pub async fn compare(&self, snapshot_id: SnapshotId) -> Result<Vec<IterationDiff>, CatalogError> {
        let iterations = self.iterations(snapshot_id).await?;
        let mut diffs = Vec::new();

        for window in iterations.windows(2) {
            let (_, prev_rows) = &window[0];
            let (_, next_rows) = &window[1];

            let prev_by_ref: HashMap<&str, &NormalizedItem> =
                prev_rows.iter().map(|i| (i.normalized_reference(), i)).collect();
            let next_by_ref: HashMap<&str, &NormalizedItem> =
                next_rows.iter().map(|i| (i.normalized_reference(), i)).collect();

            let prev_keys: HashSet<&str> = prev_by_ref.keys().copied().collect();
            let next_keys: HashSet<&str> = next_by_ref.keys().copied().collect();

            let added = next_keys.difference(&prev_keys).map(|s| s.to_string()).collect();
            let removed = prev_keys.difference(&next_keys).map(|s| s.to_string()).collect();
            let changed = prev_keys
                .intersection(&next_keys)
                .filter(|key| {
                    let before = prev_by_ref[*key];
                    let after = next_by_ref[*key];
                    before.taxonomy_code() != after.taxonomy_code() || before.confidence().value() != after.confidence().value()
                })
                .map(|s| s.to_string())
                .collect();

            diffs.push(IterationDiff { added, removed, changed });
        }

        Ok(diffs)
    }

    /// For every `normalized_reference` appearing in at least 2
    /// iterations, a time-ordered trail of its evolution.
    pub async fn evolution(&self, snapshot_id: SnapshotId) -> Result<HashMap<String, Vec<EvolutionPoint>>, CatalogError> {
        let iterations = self.iterations(snapshot_id).await?;
        let mut trails: HashMap<String, Vec<EvolutionPoint>> = HashMap::new();

        for (iteration_index, rows) in &iterations {
            for row in rows {
                trails.entry(row.normalized_reference().to_string()).or_default().push(EvolutionPoint {
                    iteration_index: *iteration_index,
                    merged_count: row.merged_count(),
                    confidence: row.confidence().value(),
                    code: row.taxonomy_code().map(str::to_string),
                });
            }
        }

        trails.retain(|_, points| points.len() >= 2);
        for points in trails.values_mut() {
            points.sort_by_key(|p| p.iteration_index);
        }
        Ok(trails)
    }

    /// Per-iteration aggregate metrics.
    pub async fn metrics(&self, snapshot_id: SnapshotId) -> Result<Vec<IterationMetrics>, CatalogError> {
        let iterations = self.iterations(snapshot_id).await?;
        Ok(iterations
            .into_iter()
            .map(|(iteration_index, rows)| {
                let total_processed = rows.len();
                let unique_groups = rows.iter().map(|r| r.normalized_reference()).collect::<HashSet<_>>().len();
                let avg_confidence = if total_processed == 0 {
                    0.0
                } else {
                    rows.iter().map(|r| r.confidence().value()).sum::<f32>() / total_processed as f32
                };
                let success_rate = if total_processed == 0 {
                    0.0
                } else {
                    rows.iter().filter(|r| r.confidence().value() >= 0.8).count() as f32 / total_processed as f32
                };
                IterationMetrics { iteration_index, total_processed, unique_groups, avg_confidence, success_rate }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use catalog_domain::entities::{CatalogItem, Upload, UploadStatus};
    use catalog_domain::value_objects::{CatalogItemId, Confidence, NormalizedItemId, ProcessingLevel};

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
        async fn find_pending_for_stage(
            &self,
            _upload_id: UploadId,
            _stage: &str,
            _batch_size: usize,
        ) -> Result<Vec<CatalogItem>, CatalogError> {
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

    struct Fixture {
        engine: SnapshotEngine,
        uploads: Arc<InMemoryUploads>,
        catalog_items: Arc<InMemoryCatalogItems>,
        normalized_items: Arc<InMemoryNormalizedItems>,
        snapshots: Arc<InMemorySnapshots>,
    }

    fn fixture() -> Fixture {
        let snapshots = Arc::new(InMemorySnapshots::default());
        let uploads = Arc::new(InMemoryUploads::default());
        let catalog_items = Arc::new(InMemoryCatalogItems::default());
        let normalized_items = Arc::new(InMemoryNormalizedItems::default());
        let engine = SnapshotEngine::new(
            snapshots.clone(),
            uploads.clone(),
            catalog_items.clone(),
            normalized_items.clone(),
        );
        Fixture { engine, uploads, catalog_items, normalized_items, snapshots }
    }

    /// Seeds one completed upload holding a single source item whose
    /// normalized row carries `code`/`confidence`, returning the upload id.
    async fn seed_iteration(fx: &Fixture, at: DateTime<Utc>, reference: &str, code: &str, confidence: f32) -> UploadId {
        let mut upload = Upload::handshake(at);
        upload.complete(at).unwrap();
        fx.uploads.save(&upload).await.unwrap();

        let source = CatalogItem::new(
            upload.id(),
            format!("ext-{reference}"),
            None,
            reference.to_string(),
            Default::default(),
            serde_json::Value::Null,
            at,
        );
        fx.catalog_items.save(&source).await.unwrap();

        let mut normalized = NormalizedItem::new(source.id(), reference, reference, reference);
        normalized.classify(code, reference, Confidence::new(confidence), ProcessingLevel::Enhanced, None).unwrap();
        fx.normalized_items.save(&normalized).await.unwrap();

        upload.id()
    }

    #[tokio::test]
    async fn create_snapshot_rejects_incomplete_upload() {
        let fx = fixture();
        let upload = Upload::handshake(Utc::now());
        fx.uploads.save(&upload).await.unwrap();
        assert!(matches!(upload.status(), UploadStatus::InProgress));

        let err = fx
            .engine
            .create_snapshot("bad", None, "acme", None, vec![upload.id()], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn create_snapshot_persists_memberships_in_upload_order() {
        let fx = fixture();
        let t0 = Utc::now();
        let u1 = seed_iteration(&fx, t0, "ref-a", "1.1.1", 0.9).await;
        let u2 = seed_iteration(&fx, t0 + chrono::Duration::hours(1), "ref-a", "1.1.2", 0.95).await;

        let snapshot = fx.engine.create_snapshot("it1", None, "acme", None, vec![u1, u2], t0).await.unwrap();
        assert_eq!(snapshot.iteration_count(), 2);
        assert_eq!(fx.snapshots.find_by_id(snapshot.id()).await.unwrap().unwrap().iteration_count(), 2);
    }

    #[tokio::test]
    async fn auto_snapshot_takes_latest_n_completed_uploads_oldest_to_newest() {
        let fx = fixture();
        let t0 = Utc::now();
        let old = seed_iteration(&fx, t0, "ref-old", "1.1.1", 0.9).await;
        let mid = seed_iteration(&fx, t0 + chrono::Duration::hours(1), "ref-mid", "1.1.1", 0.9).await;
        let new = seed_iteration(&fx, t0 + chrono::Duration::hours(2), "ref-new", "1.1.1", 0.9).await;

        let snapshot = fx.engine.auto_snapshot("acme", 2, t0 + chrono::Duration::hours(3)).await.unwrap();
        let uploads: Vec<UploadId> = snapshot.memberships().iter().map(|m| m.upload_id).collect();
        assert_eq!(uploads, vec![mid, new]);
        assert!(!uploads.contains(&old));
    }

    #[tokio::test]
    async fn compare_detects_added_removed_and_changed_groups() {
        let fx = fixture();
        let t0 = Utc::now();
        let u1 = seed_iteration(&fx, t0, "stays", "1.1.1", 0.9).await;
        seed_iteration(&fx, t0, "leaves", "1.1.1", 0.9).await;
        let u2 = seed_iteration(&fx, t0 + chrono::Duration::hours(1), "stays", "1.1.2", 0.95).await;
        seed_iteration(&fx, t0 + chrono::Duration::hours(1), "arrives", "1.1.1", 0.9).await;

        let snapshot = fx.engine.create_snapshot("cmp", None, "acme", None, vec![u1, u2], t0).await.unwrap();
        let diffs = fx.engine.compare(snapshot.id()).await.unwrap();

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].added, vec!["arrives".to_string()]);
        assert_eq!(diffs[0].removed, vec!["leaves".to_string()]);
        assert_eq!(diffs[0].changed, vec!["stays".to_string()]);
    }

    #[tokio::test]
    async fn evolution_only_tracks_references_seen_in_multiple_iterations() {
        let fx = fixture();
        let t0 = Utc::now();
        let u1 = seed_iteration(&fx, t0, "tracked", "1.1.1", 0.9).await;
        seed_iteration(&fx, t0, "single-shot", "1.1.1", 0.9).await;
        let u2 = seed_iteration(&fx, t0 + chrono::Duration::hours(1), "tracked", "1.1.2", 0.95).await;

        let snapshot = fx.engine.create_snapshot("evo", None, "acme", None, vec![u1, u2], t0).await.unwrap();
        let trails = fx.engine.evolution(snapshot.id()).await.unwrap();

        assert_eq!(trails.len(), 1);
        let trail = &trails["tracked"];
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].iteration_index, 0);
        assert_eq!(trail[1].iteration_index, 1);
        assert_eq!(trail[1].code.as_deref(), Some("1.1.2"));
    }

    #[tokio::test]
    async fn metrics_reports_per_iteration_aggregates() {
        let fx = fixture();
        let t0 = Utc::now();
        let u1 = seed_iteration(&fx, t0, "a", "1.1.1", 0.9).await;
        seed_iteration(&fx, t0, "b", "1.1.1", 0.5).await;

        let snapshot = fx.engine.create_snapshot("metrics", None, "acme", None, vec![u1], t0).await.unwrap();
        let metrics = fx.engine.metrics(snapshot.id()).await.unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].total_processed, 2);
        assert_eq!(metrics[0].unique_groups, 2);
        assert!((metrics[0].avg_confidence - 0.7).abs() < 1e-6);
        assert!((metrics[0].success_rate - 0.5).abs() < 1e-6);
    }
}
