//! # AI Orchestrator
//!
//! Routes `ClassifyRequest`s across registered `ProviderAdapter`s with
//! per-provider concurrency limits, a circuit breaker, and a pluggable
//! dispatch strategy (spec.md §4.3). Mirrors the teacher's adaptive
//! pipeline stage executor: an in-memory runtime view backed by a
//! `ProviderRepository` for durability across restarts.

use chrono::Utc;
use futures::future::select_all;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::entities::Provider;
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::ProviderRepository;
use catalog_domain::services::{ClassifyRequest, ClassifyResponse, ProviderAdapter};
use catalog_domain::value_objects::{ChannelCount, Priority};

use crate::infrastructure::config::OrchestratorConfig;

use super::circuit_breaker::CooldownTracker;
use super::strategy::{self, Strategy};

pub struct ProviderMetrics {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    total_latency_ms: AtomicU64,
}

impl ProviderMetrics {
    fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            successful: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
        }
    }

    fn record_success(&self, latency: Duration) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.successful.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mean latency of successful calls, in milliseconds. Providers with
    /// no successful calls yet sort last under the `fastest` strategy.
    pub fn avg_latency_ms(&self) -> f64 {
        let successful = self.successful.load(Ordering::Relaxed);
        if successful == 0 {
            return f64::MAX;
        }
        self.total_latency_ms.load(Ordering::Relaxed) as f64 / successful as f64
    }

    pub fn snapshot(&self) -> ProviderMetricsSnapshot {
        ProviderMetricsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            successful: self.successful.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            avg_latency_ms: self.avg_latency_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderMetricsSnapshot {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_latency_ms: f64,
}

pub struct ProviderRuntime {
    pub(super) provider: Mutex<Provider>,
    adapter: Arc<dyn ProviderAdapter>,
    semaphore: Arc<Semaphore>,
    in_flight: AtomicUsize,
    cooldown: CooldownTracker,
    pub(super) metrics: ProviderMetrics,
}

impl ProviderRuntime {
    pub(super) fn load_ratio(&self) -> f64 {
        let channels = self.provider.lock().channels().value().max(1) as f64;
        self.in_flight.load(Ordering::Relaxed) as f64 / channels
    }
}

/// Routes AI classification calls across registered providers.
pub struct Orchestrator {
    providers: RwLock<Vec<Arc<ProviderRuntime>>>,
    strategy: RwLock<Strategy>,
    round_robin_idx: AtomicUsize,
    provider_repo: Arc<dyn ProviderRepository>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(provider_repo: Arc<dyn ProviderRepository>, config: OrchestratorConfig) -> Self {
        let strategy = config.default_strategy.parse().unwrap_or(Strategy::Priority);
        Self {
            providers: RwLock::new(Vec::new()),
            strategy: RwLock::new(strategy),
            round_robin_idx: AtomicUsize::new(0),
            provider_repo,
            config,
        }
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        *self.strategy.write() = strategy;
    }

    pub fn strategy(&self) -> Strategy {
        *self.strategy.read()
    }

    /// Registers (or re-registers) a provider. Idempotent by
    /// `provider_key` — re-registering with the same key updates the
    /// adapter and config in place rather than creating a duplicate
    /// runtime; the channel semaphore is recreated, so requests already
    /// holding a permit from the old one finish unaffected.
    pub async fn register_provider(
        &self,
        provider_key: &str,
        display_name: &str,
        adapter: Arc<dyn ProviderAdapter>,
        priority: Priority,
        channels: ChannelCount,
    ) -> Result<(), CatalogError> {
        let existing = self.provider_repo.find_by_key(provider_key).await?;
        let provider = match existing {
            Some(mut found) => {
                found.set_priority(priority);
                found.set_channels(channels);
                found
            }
            None => {
                let mut fresh = Provider::new(provider_key, display_name);
                fresh.set_priority(priority);
                fresh.set_channels(channels);
                fresh
            }
        };
        self.provider_repo.upsert(&provider).await?;

        let runtime = Arc::new(ProviderRuntime {
            semaphore: Arc::new(Semaphore::new(channels.value())),
            in_flight: AtomicUsize::new(0),
            cooldown: CooldownTracker::new(self.config.circuit_cooldown_ms, self.config.circuit_cooldown_max_ms),
            metrics: ProviderMetrics::new(),
            provider: Mutex::new(provider),
            adapter,
        });

        let mut providers = self.providers.write();
        providers.retain(|p| p.provider.lock().provider_key() != provider_key);
        providers.push(runtime);
        info!(provider = provider_key, "registered AI provider");
        Ok(())
    }

    pub fn metrics(&self) -> Vec<(String, ProviderMetricsSnapshot)> {
        self.providers
            .read()
            .iter()
            .map(|p| (p.provider.lock().provider_key().to_string(), p.metrics.snapshot()))
            .collect()
    }

    async fn handle_failure(&self, runtime: &ProviderRuntime, err: &CatalogError) {
        let is_soft_429 = self.config.treat_429_as_soft && matches!(err, CatalogError::Transient(msg) if msg.contains("429"));
        if is_soft_429 {
            warn!("provider returned 429, treated as soft failure (not counted toward circuit trip)");
            return;
        }
        if !err.is_provider_failure() {
            return;
        }

        let was_half_open = {
            let provider = runtime.provider.lock();
            provider.circuit_state() == catalog_domain::entities::CircuitState::HalfOpen
        };
        let cooldown_ms = runtime.cooldown.next_cooldown_ms(was_half_open);
        let until = Utc::now() + chrono::Duration::milliseconds(cooldown_ms as i64);

        let snapshot = {
            let mut provider = runtime.provider.lock();
            provider.record_failure(self.config.circuit_fail_threshold, until);
            provider.clone()
        };
        if let Err(db_err) = self.provider_repo.upsert(&snapshot).await {
            warn!(error = %db_err, "failed to persist provider circuit state");
        }
    }

    /// Races a channel-acquire attempt across every one of `candidates` at
    /// once, bounded by `budget`. Per spec.md line 112, "first with a free
    /// channel wins": when several candidates already have a free channel,
    /// `candidates`' order (the strategy's ordering) decides which permit
    /// is returned, since it's polled first. A busy top-priority provider
    /// therefore cannot block a free lower-priority one from being tried.
    async fn acquire_any(
        candidates: &[Arc<ProviderRuntime>],
        budget: Duration,
    ) -> Option<(Arc<ProviderRuntime>, OwnedSemaphorePermit)> {
        if candidates.is_empty() || budget.is_zero() {
            return None;
        }

        let attempts: Vec<Pin<Box<dyn Future<Output = (Arc<ProviderRuntime>, OwnedSemaphorePermit)> + Send>>> = candidates
            .iter()
            .cloned()
            .map(|runtime| {
                Box::pin(async move {
                    let permit = Arc::clone(&runtime.semaphore)
                        .acquire_owned()
                        .await
                        .expect("provider semaphore is never closed");
                    (runtime, permit)
                }) as Pin<Box<dyn Future<Output = _> + Send>>
            })
            .collect();

        tokio::time::timeout(budget, select_all(attempts)).await.ok().map(|(pair, _idx, _rest)| pair)
    }

    /// Dispatches one classification request to an eligible provider,
    /// per the configured strategy, honoring per-provider concurrency
    /// limits and the circuit breaker. Fails fast with
    /// `AllProvidersFailed` when every registered provider is
    /// circuit-open, disabled, or at capacity (no AI-timeout wait in that
    /// case); races for a free channel up to `ai_timeout_secs` otherwise.
    pub async fn classify(
        &self,
        request: ClassifyRequest,
        cancel: CancellationToken,
    ) -> Result<ClassifyResponse, CatalogError> {
        let now = Utc::now();
        let providers = self.providers.read().clone();
        if providers.is_empty() {
            return Err(CatalogError::all_providers_failed("no AI providers registered"));
        }

        for runtime in &providers {
            runtime.provider.lock().try_half_open(now);
        }

        let eligible: Vec<Arc<ProviderRuntime>> = providers
            .iter()
            .filter(|p| {
                let provider = p.provider.lock();
                let has_free_channel = p.in_flight.load(Ordering::Relaxed) < provider.channels().value();
                provider.enabled() && provider.is_eligible(now) && has_free_channel
            })
            .cloned()
            .collect();

        if eligible.is_empty() {
            return Err(CatalogError::all_providers_failed(
                "all providers are disabled, circuit-open, or at capacity",
            ));
        }

        let mut candidates = strategy::order(self.strategy(), &eligible, &self.round_robin_idx);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(self.config.ai_timeout_secs);
        let mut attempted_any = false;
        let mut last_err: Option<CatalogError> = None;

        while !candidates.is_empty() {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }

            let (runtime, permit) = match Self::acquire_any(&candidates, remaining).await {
                Some(pair) => pair,
                None => break,
            };
            candidates.retain(|r| !Arc::ptr_eq(r, &runtime));

            attempted_any = true;
            runtime.in_flight.fetch_add(1, Ordering::Relaxed);
            runtime.provider.lock().mark_request(Utc::now());

            let call = runtime.adapter.classify(request.clone(), cancel.clone());
            let result = tokio::select! {
                res = call => Some(res),
                _ = cancel.cancelled() => None,
            };

            runtime.in_flight.fetch_sub(1, Ordering::Relaxed);
            drop(permit);

            match result {
                None => return Err(CatalogError::timeout("classify request cancelled")),
                Some(Ok(response)) => {
                    runtime.metrics.record_success(response.latency);
                    runtime.cooldown.reset();
                    let snapshot = {
                        let mut provider = runtime.provider.lock();
                        provider.record_success();
                        provider.clone()
                    };
                    let _ = self.provider_repo.upsert(&snapshot).await;
                    return Ok(response);
                }
                Some(Err(err)) => {
                    runtime.metrics.record_failure();
                    self.handle_failure(&runtime, &err).await;
                    last_err = Some(err);
                }
            }
        }

        if attempted_any {
            Err(CatalogError::all_providers_failed(
                last_err.map(|e| e.to_string()).unwrap_or_else(|| "no provider succeeded".to_string()),
            ))
        } else {
            Err(CatalogError::no_capacity(
                "no provider channel became available within the AI timeout",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;

    struct FlakyAdapter {
        fail: AtomicBool,
    }

    #[async_trait]
    impl ProviderAdapter for FlakyAdapter {
        async fn classify(&self, _request: ClassifyRequest, _cancel: CancellationToken) -> Result<ClassifyResponse, CatalogError> {
            if self.fail.load(Ordering::Relaxed) {
                Err(CatalogError::transient("simulated failure"))
            } else {
                Ok(ClassifyResponse {
                    answer: "25.94.11".to_string(),
                    latency: Duration::from_millis(5),
                })
            }
        }
    }

    struct InMemoryProviderRepo {
        rows: Mutex<Vec<Provider>>,
    }

    #[async_trait]
    impl ProviderRepository for InMemoryProviderRepo {
        async fn upsert(&self, provider: &Provider) -> Result<(), CatalogError> {
            let mut rows = self.rows.lock();
            rows.retain(|p| p.provider_key() != provider.provider_key());
            rows.push(provider.clone());
            Ok(())
        }
        async fn find_by_id(&self, id: catalog_domain::value_objects::ProviderId) -> Result<Option<Provider>, CatalogError> {
            Ok(self.rows.lock().iter().find(|p| p.id() == id).cloned())
        }
        async fn find_by_key(&self, provider_key: &str) -> Result<Option<Provider>, CatalogError> {
            Ok(self.rows.lock().iter().find(|p| p.provider_key() == provider_key).cloned())
        }
        async fn list_enabled(&self) -> Result<Vec<Provider>, CatalogError> {
            Ok(self.rows.lock().iter().filter(|p| p.enabled()).cloned().collect())
        }
        async fn list_all(&self) -> Result<Vec<Provider>, CatalogError> {
            Ok(self.rows.lock().clone())
        }
    }

    fn repo() -> Arc<dyn ProviderRepository> {
        Arc::new(InMemoryProviderRepo { rows: Mutex::new(Vec::new()) })
    }

    #[tokio::test]
    async fn successful_classify_returns_response() {
        let orchestrator = Orchestrator::new(repo(), OrchestratorConfig::default());
        orchestrator
            .register_provider(
                "openai",
                "OpenAI",
                Arc::new(FlakyAdapter { fail: AtomicBool::new(false) }),
                Priority::default(),
                ChannelCount::default(),
            )
            .await
            .unwrap();

        let response = orchestrator
            .classify(
                ClassifyRequest { prompt: "bolt".to_string(), hint: None },
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.answer, "25.94.11");
    }

    #[tokio::test]
    async fn all_providers_circuit_open_fails_fast() {
        let mut config = OrchestratorConfig::default();
        config.circuit_fail_threshold = 1;
        let orchestrator = Orchestrator::new(repo(), config);
        orchestrator
            .register_provider(
                "openai",
                "OpenAI",
                Arc::new(FlakyAdapter { fail: AtomicBool::new(true) }),
                Priority::default(),
                ChannelCount::default(),
            )
            .await
            .unwrap();

        let first = orchestrator
            .classify(ClassifyRequest { prompt: "bolt".to_string(), hint: None }, CancellationToken::new())
            .await;
        assert!(first.is_err());

        let second = orchestrator
            .classify(ClassifyRequest { prompt: "bolt".to_string(), hint: None }, CancellationToken::new())
            .await;
        assert!(matches!(second, Err(CatalogError::AllProvidersFailed(_))));
    }
}
