//! # Metrics Service
//!
//! Prometheus metrics registry for the pipeline, orchestrator, similarity
//! cache, and quality assessor. Grounded on the teacher's
//! `infrastructure/metrics/metrics_service.rs` category layout (Counter/
//! Gauge/Histogram per subsystem, with label dimensions for
//! stage/provider/status).

use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry};

pub struct MetricsRegistry {
    pub registry: Registry,
    pub stage_items_processed: IntCounterVec,
    pub stage_items_errored: IntCounterVec,
    pub stage_duration: Histogram,
    pub orchestrator_requests: IntCounterVec,
    pub orchestrator_latency: Histogram,
    pub provider_in_flight: IntGaugeVec,
    pub similarity_cache_hits: IntCounterVec,
    pub snapshot_runs: IntCounterVec,
    pub quality_runs: IntCounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let stage_items_processed = IntCounterVec::new(
            Opts::new("catalog_stage_items_processed_total", "Items advanced past a pipeline stage"),
            &["stage"],
        )
        .expect("valid metric");
        let stage_items_errored = IntCounterVec::new(
            Opts::new("catalog_stage_items_errored_total", "Per-item errors recorded by a pipeline stage"),
            &["stage"],
        )
        .expect("valid metric");
        let stage_duration = Histogram::with_opts(HistogramOpts::new(
            "catalog_stage_batch_duration_seconds",
            "Wall time to process one stage batch",
        ))
        .expect("valid metric");

        let orchestrator_requests = IntCounterVec::new(
            Opts::new("catalog_orchestrator_requests_total", "AI orchestrator classify attempts"),
            &["provider", "status"],
        )
        .expect("valid metric");
        let orchestrator_latency = Histogram::with_opts(HistogramOpts::new(
            "catalog_orchestrator_latency_seconds",
            "AI provider call latency",
        ))
        .expect("valid metric");
        let provider_in_flight = IntGaugeVec::new(
            Opts::new("catalog_provider_in_flight", "Current in-flight requests per provider"),
            &["provider"],
        )
        .expect("valid metric");

        let similarity_cache_hits = IntCounterVec::new(
            Opts::new("catalog_similarity_cache_total", "Similarity cache lookups"),
            &["outcome"],
        )
        .expect("valid metric");

        let snapshot_runs = IntCounterVec::new(
            Opts::new("catalog_snapshot_operations_total", "Snapshot engine operations"),
            &["operation"],
        )
        .expect("valid metric");
        let quality_runs = IntCounterVec::new(
            Opts::new("catalog_quality_assessor_runs_total", "Quality assessor operations"),
            &["operation"],
        )
        .expect("valid metric");

        for collector in [
            Box::new(stage_items_processed.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(stage_items_errored.clone()),
            Box::new(stage_duration.clone()),
            Box::new(orchestrator_requests.clone()),
            Box::new(orchestrator_latency.clone()),
            Box::new(provider_in_flight.clone()),
            Box::new(similarity_cache_hits.clone()),
            Box::new(snapshot_runs.clone()),
            Box::new(quality_runs.clone()),
        ] {
            let _ = registry.register(collector);
        }

        Self {
            registry,
            stage_items_processed,
            stage_items_errored,
            stage_duration,
            orchestrator_requests,
            orchestrator_latency,
            provider_in_flight,
            similarity_cache_hits,
            snapshot_runs,
            quality_runs,
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
