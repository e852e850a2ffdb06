//! # Metrics / Health Endpoint
//!
//! Renders the Prometheus text exposition format and a small readiness
//! summary. Kept transport-agnostic (a plain render function) since the
//! HTTP layer itself is out of scope (spec.md §1); an operator wires this
//! into whatever listener they run.

use prometheus::Encoder;

use super::service::MetricsRegistry;

pub fn render_prometheus_text(metrics: &MetricsRegistry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let families = metrics.registry.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthReport {
    pub store_reachable: bool,
    pub pipeline_active: bool,
}

pub fn render_health(store_reachable: bool, pipeline_active: bool) -> HealthReport {
    HealthReport {
        store_reachable,
        pipeline_active,
    }
}
