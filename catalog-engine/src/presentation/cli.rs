// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Admin CLI
//!
//! Dispatches a validated [`catalog_bootstrap::Command`] against the
//! wired-up application services. `main.rs` constructs a [`Services`]
//! bundle once at startup and calls [`dispatch`] with the parsed command.

use std::io::BufRead;
use std::sync::Arc;

use catalog_bootstrap::Command;
use catalog_domain::cancellation::CancellationToken;
use catalog_domain::error::CatalogError;
use catalog_domain::services::IngestGateway;
use catalog_domain::value_objects::{CatalogId, CounterpartyId, SnapshotId, UploadId};
use chrono::Utc;

use crate::application::classifier::HierarchicalClassifier;
use crate::application::enrichment::EnrichmentService;
use crate::application::quality::QualityAssessor;
use crate::application::snapshot::SnapshotEngine;
use crate::application::{InProcessIngestGateway, PipelineEngine, PipelineOptions};

/// The one target database an admin CLI invocation operates against.
/// Until multi-database operation is wired in, this is always `"main"`.
const DEFAULT_DB_REF: &str = "main";

pub struct Services {
    pub pipeline: Arc<PipelineEngine>,
    pub classifier: Arc<HierarchicalClassifier>,
    pub quality: Arc<QualityAssessor>,
    pub snapshots: Arc<SnapshotEngine>,
    pub enrichment: Arc<EnrichmentService>,
    pub ingest: Arc<InProcessIngestGateway>,
}

/// Runs `command` against `services`, returning the text the CLI prints
/// to stdout on success. Errors propagate to the caller for exit-code
/// mapping via `catalog_bootstrap::exit_code`.
pub async fn dispatch(services: &Services, command: Command) -> Result<String, CatalogError> {
    match command {
        Command::IngestReplay { file, config_name } => ingest_replay(services, &file, &config_name).await,
        Command::PipelineStart { upload, batch_size } => pipeline_start(services, upload, batch_size).await,
        Command::PipelineStop => pipeline_stop(services),
        Command::PipelineStatus => pipeline_status(services).await,
        Command::SnapshotCreate { label } => snapshot_create(services, label).await,
        Command::SnapshotCompare { left: _, right } => snapshot_compare(services, right).await,
        Command::SnapshotEvolution { snapshot } => snapshot_evolution(services, snapshot).await,
        Command::SnapshotMetrics { snapshot } => snapshot_metrics(services, snapshot).await,
        Command::QualityRun { upload: _, similarity_threshold: _ } => quality_run(services).await,
        Command::QualityResolve { violation } => quality_resolve(services, violation).await,
        Command::QualityApply { suggestion } => quality_apply(services, suggestion).await,
        Command::EnrichmentRun { upload: _ } => enrichment_run(services).await,
        Command::EnrichmentMerge { primary, duplicates } => enrichment_merge(services, primary, duplicates).await,
    }
}

async fn ingest_replay(services: &Services, file: &std::path::Path, config_name: &str) -> Result<String, CatalogError> {
    let handle = std::fs::File::open(file).map_err(|e| CatalogError::io_error(format!("opening {}: {e}", file.display())))?;
    let reader = std::io::BufReader::new(handle);
    let now = Utc::now();
    let upload_id = services.ingest.handshake("1.0", config_name, now).await?;

    let mut submitted = 0usize;
    for line in reader.lines() {
        let line = line.map_err(|e| CatalogError::io_error(format!("reading {}: {e}", file.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: catalog_domain::services::IngestItemRecord =
            serde_json::from_str(&line).map_err(|e| CatalogError::validation(format!("malformed ingest record: {e}")))?;
        services.ingest.submit_item(upload_id, record, now).await?;
        submitted += 1;
    }

    services.ingest.record_catalog(upload_id).await?;
    services.ingest.complete(upload_id, now).await?;

    Ok(format!("replayed {submitted} item(s) into upload {upload_id}, now complete"))
}

async fn pipeline_start(services: &Services, upload: Option<uuid::Uuid>, batch_size: usize) -> Result<String, CatalogError> {
    let run_id = upload.map(CatalogId::from_uuid).unwrap_or_else(UploadId::new);
    let options = PipelineOptions { run_id, cancel: CancellationToken::new() };
    let aggregate = services.pipeline.start(DEFAULT_DB_REF, options).await?;
    let _ = batch_size; // batch size is fixed at engine construction time, not per-run
    Ok(format!("pipeline run {} finished in state {:?}", aggregate.upload_id(), aggregate.state()))
}

fn pipeline_stop(services: &Services) -> Result<String, CatalogError> {
    let stopped = services.pipeline.stop(DEFAULT_DB_REF);
    Ok(if stopped { "pipeline run cancelled".to_string() } else { "no pipeline run was active".to_string() })
}

async fn pipeline_status(services: &Services) -> Result<String, CatalogError> {
    let status = services.pipeline.status(DEFAULT_DB_REF).await;
    Ok(format!(
        "running={} state={:?} final_rows={} stages={}",
        status.running,
        status.state,
        status.final_rows,
        status.per_stage.len(),
    ))
}

async fn snapshot_create(services: &Services, label: Option<String>) -> Result<String, CatalogError> {
    let name = label.unwrap_or_else(|| format!("snapshot-{}", Utc::now().format("%Y%m%dT%H%M%S")));
    let snapshot = services.snapshots.create_snapshot(&name, None, DEFAULT_DB_REF, None, Vec::new(), Utc::now()).await?;
    Ok(format!("created snapshot {} ({name})", snapshot.id()))
}

async fn snapshot_compare(services: &Services, right: uuid::Uuid) -> Result<String, CatalogError> {
    let diffs = services.snapshots.compare(SnapshotId::from_uuid(right)).await?;
    Ok(format!("{} item(s) differ", diffs.len()))
}

async fn snapshot_evolution(services: &Services, snapshot: uuid::Uuid) -> Result<String, CatalogError> {
    let trails = services.snapshots.evolution(SnapshotId::from_uuid(snapshot)).await?;
    Ok(format!("{} normalized reference(s) have an evolution trail", trails.len()))
}

async fn snapshot_metrics(services: &Services, snapshot: uuid::Uuid) -> Result<String, CatalogError> {
    let metrics = services.snapshots.metrics(SnapshotId::from_uuid(snapshot)).await?;
    Ok(format!("{} iteration metric record(s)", metrics.len()))
}

async fn quality_run(services: &Services) -> Result<String, CatalogError> {
    let counts = services.quality.analyze(200, |_progress| {}).await?;
    Ok(format!(
        "scanned {} row(s): {} duplicate group(s), {} violation(s), {} suggestion(s)",
        counts.rows_scanned, counts.duplicate_groups_found, counts.violations_found, counts.suggestions_found
    ))
}

async fn quality_resolve(services: &Services, violation: uuid::Uuid) -> Result<String, CatalogError> {
    services.quality.resolve(violation, "admin-cli").await?;
    Ok(format!("resolved violation {violation}"))
}

async fn quality_apply(services: &Services, suggestion: uuid::Uuid) -> Result<String, CatalogError> {
    services.quality.apply(suggestion).await?;
    Ok(format!("applied suggestion {suggestion}"))
}

async fn enrichment_run(services: &Services) -> Result<String, CatalogError> {
    let groups = services.enrichment.find_duplicates().await?;
    Ok(format!("found {} duplicate counterparty group(s)", groups.len()))
}

async fn enrichment_merge(services: &Services, primary: uuid::Uuid, duplicates: Vec<uuid::Uuid>) -> Result<String, CatalogError> {
    let primary_id = CounterpartyId::from_uuid(primary);
    let duplicate_ids: Vec<CounterpartyId> = duplicates.into_iter().map(CounterpartyId::from_uuid).collect();
    let merged = services.enrichment.merge_duplicates(primary_id, &duplicate_ids).await?;
    Ok(format!("merged {} duplicate(s) into {}", duplicate_ids.len(), merged.id()))
}
