mod endpoint;
mod service;

pub use endpoint::{render_health, render_prometheus_text, HealthReport};
pub use service::MetricsRegistry;
