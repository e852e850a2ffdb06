// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared in-memory repository fakes and full-pipeline wiring helpers for
//! the integration tests that need more than one stage chained together.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use catalog_domain::entities::{CatalogItem, NormalizedItem, Provider, Upload};
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{CatalogItemRepository, ClassifierRepository, NormalizedItemRepository, ProviderRepository, UploadRepository};
use catalog_domain::services::{BenchmarkFinder, BenchmarkMatch};
use catalog_domain::value_objects::{CatalogItemId, NormalizedItemId, ProviderId, SimilarityWeights, UploadId};

use catalog_engine::application::classifier::HierarchicalClassifier;
use catalog_engine::application::orchestrator::Orchestrator;
use catalog_engine::application::similarity::HybridSimilarityService;
use catalog_engine::infrastructure::config::OrchestratorConfig;
use catalog_engine::infrastructure::similarity_cache::SimilarityCache;

#[derive(Default)]
pub struct InMemoryUploads {
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
pub struct InMemoryCatalogItems {
    rows: Mutex<Vec<CatalogItem>>,
}

#[async_trait]
impl CatalogItemRepository for InMemoryCatalogItems {
    async fn save(&self, item: &CatalogItem) -> Result<(), CatalogError> {
        let mut rows = self.rows.lock();
        rows.retain(|r| r.upload_id() != item.upload_id() || r.external_reference() != item.external_reference());
        rows.push(item.clone());
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
pub struct InMemoryNormalizedItems {
    rows: Mutex<Vec<NormalizedItem>>,
}

impl InMemoryNormalizedItems {
    pub fn all(&self) -> Vec<NormalizedItem> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl NormalizedItemRepository for InMemoryNormalizedItems {
    async fn save(&self, item: &NormalizedItem) -> Result<(), CatalogError> {
        let mut rows = self.rows.lock();
        rows.retain(|r| r.id() != item.id());
        rows.push(item.clone());
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
    async fn find_pending_for_stage(&self, stage: &str, batch_size: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|r| match stage {
                "stage05_completed" => !r.stages().stage05_completed,
                "stage1_completed" => r.stages().stage05_completed && !r.stages().stage1_completed,
                "stage2_completed" => r.stages().stage1_completed && !r.stages().stage2_completed,
                "stage25_completed" => r.stages().stage2_completed && !r.stages().stage25_completed,
                "stage3_completed" => r.stages().stage25_completed && !r.stages().stage3_completed,
                "stage35_completed" => r.stages().stage3_completed && !r.stages().stage35_completed,
                "stage4_completed" => r.stages().stage35_completed && !r.stages().stage4_completed,
                "stage5_completed" => r.stages().stage4_completed && !r.stages().stage5_completed,
                "stage6_completed" => r.stages().stage5_completed && !r.stages().stage6_completed,
                "stage65_completed" => r.stages().stage6_completed && !r.stages().stage65_completed,
                "stage7_ai_processed" => r.stages().stage65_completed && !r.stages().stage7_ai_processed,
                "stage8_completed" => r.stages().stage7_ai_processed && !r.stages().stage8_completed,
                "stage9_completed" => r.stages().stage8_completed && !r.stages().final_completed,
                _ => false,
            })
            .take(batch_size)
            .cloned()
            .collect())
    }
    async fn find_all_final(&self, offset: usize, limit: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
        Ok(self.rows.lock().iter().filter(|r| r.is_final()).skip(offset).take(limit).cloned().collect())
    }
    async fn count_final(&self) -> Result<usize, CatalogError> {
        Ok(self.rows.lock().iter().filter(|r| r.is_final()).count())
    }
}

pub fn build_similarity() -> Arc<HybridSimilarityService> {
    Arc::new(HybridSimilarityService::new(Arc::new(SimilarityCache::new(1024)), SimilarityWeights::default()))
}

pub struct EmptyClassifierRepo;

#[async_trait]
impl ClassifierRepository for EmptyClassifierRepo {
    async fn find_by_code(&self, _code: &str) -> Result<Option<catalog_domain::entities::ClassifierNode>, CatalogError> {
        Ok(None)
    }
    async fn children(&self, _parent_code: Option<&str>) -> Result<Vec<catalog_domain::entities::ClassifierNode>, CatalogError> {
        Ok(Vec::new())
    }
    async fn save(&self, _node: &catalog_domain::entities::ClassifierNode) -> Result<(), CatalogError> {
        Ok(())
    }
    async fn validate_tree(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// A benchmark finder that always reports an exact, high-confidence
/// match regardless of input — used where the test's only concern is
/// that *some* classification lands, not which one.
pub struct AlwaysBenchmark;

#[async_trait]
impl BenchmarkFinder for AlwaysBenchmark {
    async fn find_closest(&self, name: &str) -> Option<BenchmarkMatch> {
        Some(BenchmarkMatch { name: name.to_string(), code: "25.94.11".to_string(), similarity: catalog_domain::value_objects::SimilarityScore::new(0.97) })
    }
}

pub struct NoopProviderRepo;

#[async_trait]
impl ProviderRepository for NoopProviderRepo {
    async fn upsert(&self, _provider: &Provider) -> Result<(), CatalogError> {
        Ok(())
    }
    async fn find_by_id(&self, _id: ProviderId) -> Result<Option<Provider>, CatalogError> {
        Ok(None)
    }
    async fn find_by_key(&self, _provider_key: &str) -> Result<Option<Provider>, CatalogError> {
        Ok(None)
    }
    async fn list_enabled(&self) -> Result<Vec<Provider>, CatalogError> {
        Ok(Vec::new())
    }
    async fn list_all(&self) -> Result<Vec<Provider>, CatalogError> {
        Ok(Vec::new())
    }
}

/// A classifier wired so any item reaching the AI stage short-circuits
/// on the benchmark path, with no children to walk and no reachable
/// orchestrator provider.
pub struct WiredClassifier {
    pub repo: Arc<EmptyClassifierRepo>,
    pub hierarchical: Arc<HierarchicalClassifier>,
}

pub fn build_classifier(_similarity: Arc<HybridSimilarityService>) -> WiredClassifier {
    let repo = Arc::new(EmptyClassifierRepo);
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(NoopProviderRepo), OrchestratorConfig::default()));
    let hierarchical = Arc::new(HierarchicalClassifier::new(repo.clone(), Arc::new(AlwaysBenchmark), orchestrator, 20, 0.4, 0.92));
    WiredClassifier { repo, hierarchical }
}
