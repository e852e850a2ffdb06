// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage of the cancellation scenario: `stop()` mid-run
//! must leave the store in a state consistent with its own counters, and
//! a subsequent `start()` must pick up the remaining work rather than
//! redo it.

mod support;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::entities::NormalizedItem;
use catalog_domain::services::{IngestGateway, IngestItemRecord, StageOutcome, StageService};

use catalog_engine::application::{InProcessIngestGateway, PipelineEngine, PipelineOptions};
use catalog_engine::infrastructure::retry::RetryPolicy;

use support::{InMemoryCatalogItems, InMemoryNormalizedItems, InMemoryUploads};

/// A single-stage stand-in for the full pipeline: each batch takes a
/// few milliseconds, long enough to let the test land a `stop()` call
/// between batches deterministically.
struct SlowStage;

#[async_trait]
impl StageService for SlowStage {
    fn name(&self) -> &'static str {
        "stage05_completed"
    }

    fn is_eligible(&self, item: &NormalizedItem) -> bool {
        !item.stages().stage05_completed
    }

    async fn apply(&self, mut item: NormalizedItem) -> StageOutcome {
        tokio::time::sleep(Duration::from_millis(5)).await;
        item.stages_mut().stage05_completed = true;
        item.stages_mut().stage05_at = Some(Utc::now());
        StageOutcome::Advanced(item)
    }
}

const TOTAL_ITEMS: usize = 120;
const BATCH_SIZE: usize = 5;

#[tokio::test]
async fn stop_mid_run_leaves_consistent_counters_and_a_later_start_finishes_the_rest() {
    let catalog_items = Arc::new(InMemoryCatalogItems::default());
    let normalized_items = Arc::new(InMemoryNormalizedItems::default());
    let uploads = Arc::new(InMemoryUploads::default());

    let ingest = InProcessIngestGateway::new(uploads.clone(), catalog_items.clone());
    let now = Utc::now();
    let upload_id = ingest.handshake("1.0", "default", now).await.unwrap();
    for i in 0..TOTAL_ITEMS {
        ingest
            .submit_item(
                upload_id,
                IngestItemRecord {
                    external_reference: format!("item-{i}"),
                    external_code: None,
                    raw_name: format!("product {i}"),
                    attributes: HashMap::new(),
                    table_parts: serde_json::Value::Null,
                },
                now,
            )
            .await
            .unwrap();
    }
    ingest.complete(upload_id, now).await.unwrap();

    let pipeline = Arc::new(PipelineEngine::new(
        catalog_items.clone(),
        normalized_items.clone(),
        uploads.clone(),
        vec![Arc::new(SlowStage)],
        BATCH_SIZE,
        RetryPolicy { base: Duration::from_millis(1), factor: 2, max_attempts: 3 },
        128,
    ));

    let cancel = CancellationToken::new();
    let run_handle = {
        let pipeline = pipeline.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { pipeline.start("test-db", PipelineOptions { run_id: upload_id, cancel }).await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    let stopped = pipeline.stop("test-db");
    assert!(stopped, "stop() should find the in-flight run");

    let aggregate = tokio::time::timeout(Duration::from_secs(2), run_handle)
        .await
        .expect("status must settle within 2s of stop()")
        .unwrap()
        .unwrap();

    assert!(!pipeline.is_running("test-db"));
    assert_eq!(aggregate.state(), Some(catalog_domain::aggregates::RunState::Cancelled));

    let completed_in_store = normalized_items.all().iter().filter(|i| i.stages().stage05_completed).count();
    let counters = aggregate.stage_counters("stage05_completed");
    assert_eq!(counters.processed as usize, completed_in_store, "the aggregate's processed count must match what actually landed in the store");
    assert!(completed_in_store < TOTAL_ITEMS, "the run should have been cut off before finishing every item");
    assert!(completed_in_store > 0, "at least one batch should have completed before the stop landed");

    // A fresh start against the same items must only touch what's left.
    pipeline
        .start("test-db", PipelineOptions { run_id: upload_id, cancel: CancellationToken::new() })
        .await
        .unwrap();

    let finished = normalized_items.all().iter().filter(|i| i.stages().stage05_completed).count();
    assert_eq!(finished, TOTAL_ITEMS, "the second run must finish every item the first one left pending");
}
