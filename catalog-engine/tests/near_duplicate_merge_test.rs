// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage of the near-duplicate collapse scenario: two
//! source rows whose names differ only by punctuation/case/transliteration
//! noise must land in a single normalized group after a full pipeline run.

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::services::{IngestGateway, IngestItemRecord};
use catalog_domain::value_objects::ProcessingLevel;

use catalog_engine::application::stages::{
    ordered_stages, AiClassifyStage, AlgorithmicClassifyStage, ArticleExtractStage, AttributeExtractStage,
    DimensionExtractStage, FallbackStage, FinalDecisionStage, GroupStage, LowercaseStage, PreprocessStage,
    RefineClusteringStage, TypeDetectStage, ValidateCodeStage,
};
use catalog_engine::application::{InProcessIngestGateway, PipelineEngine, PipelineOptions};
use catalog_engine::infrastructure::retry::RetryPolicy;

use support::{build_classifier, build_similarity, InMemoryCatalogItems, InMemoryNormalizedItems, InMemoryUploads};

#[tokio::test]
async fn two_near_duplicate_names_collapse_into_one_group() {
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
                external_reference: "A1".to_string(),
                external_code: None,
                raw_name: "Болт М10×30 ГОСТ 7798".to_string(),
                attributes: HashMap::new(),
                table_parts: serde_json::Value::Null,
            },
            now,
        )
        .await
        .unwrap();
    ingest
        .submit_item(
            upload_id,
            IngestItemRecord {
                external_reference: "A2".to_string(),
                external_code: None,
                raw_name: "болт м10 х 30 гост-7798".to_string(),
                attributes: HashMap::new(),
                table_parts: serde_json::Value::Null,
            },
            now,
        )
        .await
        .unwrap();
    ingest.complete(upload_id, now).await.unwrap();

    let similarity = build_similarity();
    let classifier = build_classifier(similarity.clone());

    let stages = ordered_stages(
        PreprocessStage,
        LowercaseStage,
        TypeDetectStage,
        AttributeExtractStage::new(catalog_items.clone()),
        GroupStage::new(similarity.clone()),
        RefineClusteringStage::new(similarity.clone(), 0.85),
        ArticleExtractStage,
        DimensionExtractStage,
        AlgorithmicClassifyStage::new(classifier.repo.clone(), 0.5),
        ValidateCodeStage::new(classifier.repo.clone()),
        AiClassifyStage::new(classifier.hierarchical.clone(), CancellationToken::new(), 0.5),
        FallbackStage,
        FinalDecisionStage::new(normalized_items.clone()),
    );

    let pipeline = PipelineEngine::new(
        catalog_items.clone(),
        normalized_items.clone(),
        uploads.clone(),
        stages,
        200,
        RetryPolicy { base: std::time::Duration::from_millis(1), factor: 2, max_attempts: 3 },
        128,
    );

    pipeline
        .start("test-db", PipelineOptions { run_id: upload_id, cancel: CancellationToken::new() })
        .await
        .unwrap();

    let finals = normalized_items.all();
    assert_eq!(finals.len(), 2, "both source rows still have their own normalized row");

    let references: std::collections::HashSet<&str> = finals.iter().map(|i| i.normalized_reference()).collect();
    assert_eq!(references.len(), 1, "both rows fingerprint to the same normalized_reference group");

    let merged = finals.iter().max_by_key(|i| i.merged_count()).unwrap();
    assert_eq!(merged.merged_count(), 2, "the surviving group row must report both source rows merged");
    assert!(
        matches!(
            merged.processing_level(),
            ProcessingLevel::Enhanced | ProcessingLevel::AiEnhanced | ProcessingLevel::Benchmark
        ),
        "expected the merged group to clear basic processing, got {:?}",
        merged.processing_level()
    );
}
