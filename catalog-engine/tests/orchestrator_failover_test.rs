// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage of the provider-failover scenario: a high-priority
//! provider that always fails must not stop classification from
//! succeeding through a lower-priority provider, and its circuit must
//! trip after the configured failure threshold.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use catalog_domain::cancellation::CancellationToken;
use catalog_domain::entities::{CircuitState, Provider};
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::ProviderRepository;
use catalog_domain::services::{ClassifyRequest, ClassifyResponse, ProviderAdapter};
use catalog_domain::value_objects::{ChannelCount, Priority, ProviderId};

use catalog_engine::application::orchestrator::Orchestrator;
use catalog_engine::infrastructure::config::OrchestratorConfig;

#[derive(Default)]
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
    async fn find_by_id(&self, id: ProviderId) -> Result<Option<Provider>, CatalogError> {
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

struct AlwaysFails {
    calls: AtomicU32,
}

#[async_trait]
impl ProviderAdapter for AlwaysFails {
    async fn classify(&self, _request: ClassifyRequest, _cancel: CancellationToken) -> Result<ClassifyResponse, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CatalogError::transient("p1 is down"))
    }
}

struct AlwaysSucceeds {
    calls: AtomicU32,
}

#[async_trait]
impl ProviderAdapter for AlwaysSucceeds {
    async fn classify(&self, _request: ClassifyRequest, _cancel: CancellationToken) -> Result<ClassifyResponse, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ClassifyResponse { answer: "25.94.11".to_string(), latency: Duration::from_millis(2) })
    }
}

#[tokio::test]
async fn ten_concurrent_calls_all_succeed_via_p2_and_p1_circuit_opens() {
    let provider_repo = Arc::new(InMemoryProviderRepo::default());
    let orchestrator = Arc::new(Orchestrator::new(provider_repo.clone(), OrchestratorConfig::default()));

    let p1_adapter = Arc::new(AlwaysFails { calls: AtomicU32::new(0) });
    let p2_adapter = Arc::new(AlwaysSucceeds { calls: AtomicU32::new(0) });

    orchestrator
        .register_provider("p1", "Provider One", p1_adapter.clone(), Priority::new(1), ChannelCount::new(1))
        .await
        .unwrap();
    orchestrator
        .register_provider("p2", "Provider Two", p2_adapter.clone(), Priority::new(2), ChannelCount::new(1))
        .await
        .unwrap();

    let calls = (0..10).map(|_| {
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .classify(
                    ClassifyRequest { prompt: "bolt m10".to_string(), hint: None },
                    CancellationToken::new(),
                )
                .await
        }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()), "expected every call to succeed via the healthy provider");
    assert_eq!(p2_adapter.calls.load(Ordering::SeqCst), 10);

    let p1 = provider_repo.find_by_key("p1").await.unwrap().expect("p1 registered");
    assert_eq!(p1.circuit_state(), CircuitState::Open, "p1's circuit should trip after 5 consecutive failures");

    // The 10 calls race concurrently, so once the circuit opens mid-run no
    // further calls are routed to p1 — the failure count settles somewhere
    // in [5, 10] rather than always hitting the full 10, depending on how
    // many calls had already raced for p1's single channel before the
    // circuit flipped.
    let metrics = orchestrator.metrics();
    let p1_metrics = metrics.iter().find(|(key, _)| key == "p1").unwrap();
    assert!(
        (5..=10).contains(&p1_metrics.1.failed),
        "expected p1 to record between 5 and 10 failures, got {}",
        p1_metrics.1.failed
    );
}
