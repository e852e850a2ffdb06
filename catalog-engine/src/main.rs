// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process entry point: parse and validate CLI args, load config, open
//! both SQLite stores, wire every application service, dispatch the
//! requested command, and map the result onto a process exit code.

use std::process::ExitCode;
use std::sync::Arc;

use catalog_bootstrap::{BootstrapLogger, ConsoleLogger, ShutdownCoordinator};
use catalog_engine::application::classifier::HierarchicalClassifier;
use catalog_engine::application::enrichment::EnrichmentService;
use catalog_engine::application::orchestrator::Orchestrator;
use catalog_engine::application::quality::QualityAssessor;
use catalog_engine::application::snapshot::SnapshotEngine;
use catalog_engine::application::stages::{
    ordered_stages, AiClassifyStage, AlgorithmicClassifyStage, ArticleExtractStage, AttributeExtractStage,
    DimensionExtractStage, FallbackStage, FinalDecisionStage, GroupStage, LowercaseStage, PreprocessStage,
    RefineClusteringStage, TypeDetectStage, ValidateCodeStage,
};
use catalog_engine::application::{InProcessIngestGateway, PipelineEngine};
use catalog_engine::infrastructure::config::AppConfig;
use catalog_engine::infrastructure::repositories::schema::{initialize_main_store, initialize_service_store};
use catalog_engine::infrastructure::repositories::{
    SqliteBenchmarkFinder, SqliteCatalogItemRepository, SqliteClassifierRepository, SqliteCounterpartyRepository,
    SqliteNormalizedItemRepository, SqliteProviderRepository, SqliteQualityRepository, SqliteSnapshotRepository,
    SqliteUploadRepository,
};
use catalog_engine::infrastructure::retry::RetryPolicy;
use catalog_engine::infrastructure::similarity_cache::SimilarityCache;
use catalog_engine::infrastructure::{logging, metrics};
use catalog_engine::presentation::{dispatch, Services};
use catalog_engine::application::similarity::HybridSimilarityService;
use catalog_domain::cancellation::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let logger = ConsoleLogger::new();

    let cli = match catalog_bootstrap::parse_and_validate() {
        Ok(cli) => cli,
        Err(e) => {
            logger.error(&format!("{e}"));
            return catalog_bootstrap::ExitCode::InvalidConfiguration.into();
        }
    };

    let config_path = catalog_bootstrap::config::resolve_config_path(cli.config.as_deref());
    let config = match AppConfig::load(config_path.as_deref().and_then(|p| p.to_str())) {
        Ok(mut config) => {
            if let Some(level) = &cli.log_level {
                config.logging.level = level.clone();
            }
            config
        }
        Err(e) => {
            logger.error(&format!("{e}"));
            return catalog_bootstrap::map_error_to_exit_code(&e).into();
        }
    };

    logging::init(&config.logging);

    let shutdown = ShutdownCoordinator::new(std::time::Duration::from_secs(10));
    catalog_bootstrap::signals::install(shutdown.token());

    let result = run(config, cli.command).await;
    catalog_bootstrap::result_to_exit_code(result.map(|output| {
        println!("{output}");
    }))
    .into()
}

async fn run(config: AppConfig, command: catalog_bootstrap::Command) -> Result<String, catalog_domain::CatalogError> {
    let main_pool = initialize_main_store(&config.store.main_db_path).await?;
    let service_pool = initialize_service_store(&config.store.service_db_path).await?;

    let catalog_items = Arc::new(SqliteCatalogItemRepository::new(main_pool.clone()));
    let normalized_items = Arc::new(SqliteNormalizedItemRepository::new(main_pool.clone()));
    let uploads = Arc::new(SqliteUploadRepository::new(main_pool.clone()));
    let counterparties = Arc::new(SqliteCounterpartyRepository::new(main_pool.clone()));
    let quality = Arc::new(SqliteQualityRepository::new(main_pool.clone()));
    let snapshots = Arc::new(SqliteSnapshotRepository::new(main_pool.clone()));
    let classifier_repo = Arc::new(SqliteClassifierRepository::new(service_pool.clone()));
    let provider_repo = Arc::new(SqliteProviderRepository::new(service_pool.clone()));

    let similarity_cache = Arc::new(SimilarityCache::new(config.similarity.cache_capacity));
    let similarity: Arc<HybridSimilarityService> =
        Arc::new(HybridSimilarityService::new(similarity_cache, config.similarity.weights.clone()));
    let benchmark_finder = Arc::new(SqliteBenchmarkFinder::new(service_pool.clone(), similarity.clone()));

    let orchestrator = Arc::new(Orchestrator::new(
        provider_repo,
        catalog_engine::infrastructure::config::OrchestratorConfig {
            ai_timeout_secs: config.orchestrator.ai_timeout_secs,
            multi_provider_enabled: config.orchestrator.multi_provider_enabled,
            circuit_fail_threshold: config.orchestrator.circuit_fail_threshold,
            circuit_cooldown_ms: config.orchestrator.circuit_cooldown_ms,
            circuit_cooldown_max_ms: config.orchestrator.circuit_cooldown_max_ms,
            treat_429_as_soft: config.orchestrator.treat_429_as_soft,
            default_strategy: config.orchestrator.default_strategy.clone(),
        },
    ));

    let classifier = Arc::new(HierarchicalClassifier::new(
        classifier_repo.clone(),
        benchmark_finder.clone(),
        orchestrator.clone(),
        config.classifier.max_children_per_level,
        config.classifier.kpved_stop_threshold,
        config.classifier.benchmark_short_circuit_threshold,
    ));

    let stages = ordered_stages(
        PreprocessStage,
        LowercaseStage,
        TypeDetectStage,
        AttributeExtractStage::new(catalog_items.clone()),
        GroupStage::new(similarity.clone()),
        RefineClusteringStage::new(similarity.clone(), config.similarity.refine_cluster_threshold),
        ArticleExtractStage,
        DimensionExtractStage,
        AlgorithmicClassifyStage::new(classifier_repo.clone(), config.classifier.kpved_start_threshold),
        ValidateCodeStage::new(classifier_repo.clone()),
        AiClassifyStage::new(classifier.clone(), CancellationToken::new(), config.classifier.kpved_start_threshold),
        FallbackStage,
        FinalDecisionStage::new(normalized_items.clone()),
    );

    let retry_policy = RetryPolicy {
        base: std::time::Duration::from_millis(config.pipeline.retry_base_ms),
        factor: config.pipeline.retry_factor,
        max_attempts: config.pipeline.retry_max_attempts,
    };

    let pipeline = Arc::new(PipelineEngine::new(
        catalog_items.clone(),
        normalized_items.clone(),
        uploads.clone(),
        stages,
        config.pipeline.batch_size,
        retry_policy,
        config.pipeline.normalizer_events_buffer_size,
    ));

    let quality_assessor = Arc::new(QualityAssessor::new(
        normalized_items.clone(),
        classifier_repo.clone(),
        quality,
        similarity.clone(),
        benchmark_finder.clone(),
        config.similarity.refine_cluster_threshold,
    ));

    let snapshot_engine = Arc::new(SnapshotEngine::new(snapshots, uploads.clone(), catalog_items.clone(), normalized_items));

    // No registry provider adapters are wired by default; operators
    // register concrete HTTP adapters through the orchestrator's sibling
    // registration path once one exists.
    let enrichment = Arc::new(EnrichmentService::new(counterparties, Vec::new()));

    let ingest = Arc::new(InProcessIngestGateway::new(uploads, catalog_items));

    if config.metrics.enabled {
        tracing::info!(bind_address = %config.metrics.bind_address, "metrics rendering available via MetricsRegistry");
        let _ = metrics::MetricsRegistry::new();
    }

    let services = Services { pipeline, classifier, quality: quality_assessor, snapshots: snapshot_engine, enrichment, ingest };

    dispatch(&services, command).await
}
