// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage of the benchmark short-circuit scenario: an item
//! whose name exactly matches a loaded benchmark must resolve without
//! ever reaching the AI orchestrator.

mod support;

use std::collections::HashMap;
use std::sync::{atomic::{AtomicU32, Ordering}, Arc};
use std::time::Duration;

use async_trait::async_trait;

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::entities::ClassifierNode;
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{ClassifierRepository, ProviderRepository};
use catalog_domain::services::{BenchmarkFinder, BenchmarkMatch, ClassifyRequest, ClassifyResponse, IngestGateway, IngestItemRecord, ProviderAdapter};
use catalog_domain::value_objects::{ChannelCount, Priority, ProcessingLevel, SimilarityScore};

use catalog_engine::application::classifier::HierarchicalClassifier;
use catalog_engine::application::orchestrator::Orchestrator;
use catalog_engine::application::stages::{
    ordered_stages, AiClassifyStage, AlgorithmicClassifyStage, ArticleExtractStage, AttributeExtractStage,
    DimensionExtractStage, FallbackStage, FinalDecisionStage, GroupStage, LowercaseStage, PreprocessStage,
    RefineClusteringStage, TypeDetectStage, ValidateCodeStage,
};
use catalog_engine::application::{InProcessIngestGateway, PipelineEngine, PipelineOptions};
use catalog_engine::infrastructure::config::OrchestratorConfig;
use catalog_engine::infrastructure::retry::RetryPolicy;

use support::{build_similarity, EmptyClassifierRepo, InMemoryCatalogItems, InMemoryNormalizedItems, InMemoryUploads, NoopProviderRepo};

const BENCHMARK_NAME: &str = "Болт М10×30 ГОСТ 7798";
const BENCHMARK_CODE: &str = "25.94.11";

struct ExactNameBenchmark;

#[async_trait]
impl BenchmarkFinder for ExactNameBenchmark {
    async fn find_closest(&self, name: &str) -> Option<BenchmarkMatch> {
        // By the time the AI stage asks, preprocess + lowercase have
        // already folded the name — compare against that form, not the
        // raw ingested one.
        (name == BENCHMARK_NAME.to_lowercase())
            .then(|| BenchmarkMatch { name: BENCHMARK_NAME.to_string(), code: BENCHMARK_CODE.to_string(), similarity: SimilarityScore::new(0.99) })
    }
}

struct PanicsIfCalled {
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl ProviderAdapter for PanicsIfCalled {
    async fn classify(&self, _request: ClassifyRequest, _cancel: CancellationToken) -> Result<ClassifyResponse, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ClassifyResponse { answer: "{\"code\": \"00.00\", \"confidence\": 0.99}".to_string(), latency: Duration::from_millis(1) })
    }
}

#[tokio::test]
async fn exact_benchmark_match_resolves_without_any_orchestrator_call() {
    let catalog_items = Arc::new(InMemoryCatalogItems::default());
    let normalized_items = Arc::new(InMemoryNormalizedItems::default());
    let uploads = Arc::new(InMemoryUploads::default());

    let ingest = InProcessIngestGateway::new(uploads.clone(), catalog_items.clone());
    let now = chrono::Utc::now();
    let upload_id = ingest.handshake("1.0", "default", now).await.unwrap();
    ingest
        .submit_item(
            upload_id,
            IngestItemRecord {
                external_reference: "B1".to_string(),
                external_code: None,
                raw_name: BENCHMARK_NAME.to_string(),
                attributes: HashMap::new(),
                table_parts: serde_json::Value::Null,
            },
            now,
        )
        .await
        .unwrap();
    ingest.complete(upload_id, now).await.unwrap();

    let similarity = build_similarity();
    let classifier_repo = Arc::new(EmptyClassifierRepo);

    let provider_calls = Arc::new(AtomicU32::new(0));
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(NoopProviderRepo), OrchestratorConfig::default()));
    orchestrator
        .register_provider("p", "P", Arc::new(PanicsIfCalled { calls: provider_calls.clone() }), Priority::new(1), ChannelCount::new(1))
        .await
        .unwrap();

    let hierarchical = Arc::new(HierarchicalClassifier::new(
        classifier_repo.clone() as Arc<dyn ClassifierRepository>,
        Arc::new(ExactNameBenchmark),
        orchestrator,
        20,
        0.4,
        0.92,
    ));

    let stages = ordered_stages(
        PreprocessStage,
        LowercaseStage,
        TypeDetectStage,
        AttributeExtractStage::new(catalog_items.clone()),
        GroupStage::new(similarity.clone()),
        RefineClusteringStage::new(similarity.clone(), 0.85),
        ArticleExtractStage,
        DimensionExtractStage,
        AlgorithmicClassifyStage::new(classifier_repo.clone(), 0.5),
        ValidateCodeStage::new(classifier_repo.clone()),
        AiClassifyStage::new(hierarchical, CancellationToken::new(), 0.5),
        FallbackStage,
        FinalDecisionStage::new(normalized_items.clone()),
    );

    let pipeline = PipelineEngine::new(
        catalog_items.clone(),
        normalized_items.clone(),
        uploads.clone(),
        stages,
        200,
        RetryPolicy { base: Duration::from_millis(1), factor: 2, max_attempts: 3 },
        128,
    );

    pipeline
        .start("test-db", PipelineOptions { run_id: upload_id, cancel: CancellationToken::new() })
        .await
        .unwrap();

    let finals = normalized_items.all();
    assert_eq!(finals.len(), 1);
    let item = &finals[0];
    assert_eq!(item.processing_level(), ProcessingLevel::Benchmark);
    assert_eq!(item.taxonomy_code(), Some(BENCHMARK_CODE));
    assert_eq!(item.confidence().value(), 0.95);
    assert_eq!(provider_calls.load(Ordering::SeqCst), 0, "the orchestrator must never be reached once the benchmark matched");
}
