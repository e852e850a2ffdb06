//! # Configuration
//!
//! Layered application configuration: a TOML file as the primary source,
//! overridden by environment variables prefixed `CATALOG_` (double
//! underscore as the nesting separator, e.g. `CATALOG_PIPELINE__BATCH_SIZE`).
//! Grounded on the teacher's `infrastructure/config/config_service.rs`
//! layered-config pattern, built on the `config` crate.

use catalog_domain::value_objects::SimilarityWeights;
use serde::{Deserialize, Serialize};

use catalog_domain::CatalogError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub retry_base_ms: u64,
    pub retry_factor: u32,
    pub retry_max_attempts: u32,
    pub normalizer_events_buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            retry_base_ms: 100,
            retry_factor: 2,
            retry_max_attempts: 5,
            normalizer_events_buffer_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub kpved_start_threshold: f32,
    pub kpved_stop_threshold: f32,
    pub benchmark_short_circuit_threshold: f32,
    pub max_children_per_level: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kpved_start_threshold: 0.5,
            kpved_stop_threshold: 0.4,
            benchmark_short_circuit_threshold: 0.92,
            max_children_per_level: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    pub weights: SimilarityWeights,
    pub refine_cluster_threshold: f32,
    pub cache_capacity: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            refine_cluster_threshold: 0.85,
            cache_capacity: 100_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub ai_timeout_secs: u64,
    pub multi_provider_enabled: bool,
    pub circuit_fail_threshold: u32,
    pub circuit_cooldown_ms: u64,
    pub circuit_cooldown_max_ms: u64,
    pub treat_429_as_soft: bool,
    pub default_strategy: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ai_timeout_secs: 60,
            multi_provider_enabled: true,
            circuit_fail_threshold: 5,
            circuit_cooldown_ms: 30_000,
            circuit_cooldown_max_ms: 300_000,
            treat_429_as_soft: false,
            default_strategy: "priority".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub main_db_path: String,
    pub service_db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            main_db_path: "catalog.db".to_string(),
            service_db_path: "service.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub log_buffer_size: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_buffer_size: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub bind_address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:9898".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Loads configuration from an optional TOML file, overridden by
    /// `CATALOG_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, CatalogError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("CATALOG")
                .separator("__")
                .try_parsing(true),
        );
        let built = builder
            .build()
            .map_err(|e| CatalogError::validation(format!("failed to build config: {e}")))?;
        let config: AppConfig = built
            .try_deserialize()
            .map_err(|e| CatalogError::validation(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if !self.similarity.weights.is_valid() {
            return Err(CatalogError::validation(
                "similarity.weights must sum to 1.0",
            ));
        }
        if self.pipeline.batch_size == 0 {
            return Err(CatalogError::validation("pipeline.batch_size must be >= 1"));
        }
        if self.classifier.kpved_stop_threshold < 0.0 || self.classifier.kpved_stop_threshold > 1.0 {
            return Err(CatalogError::validation(
                "classifier.kpved_stop_threshold must be in [0,1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn unbalanced_weights_fail_validation() {
        let mut config = AppConfig::default();
        config.similarity.weights.token_jaccard = 0.9;
        assert!(config.validate().is_err());
    }
}
