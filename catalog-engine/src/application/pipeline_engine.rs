//! # Pipeline Engine
//!
//! Drives every pending `NormalizedItem` through the fixed ordered stage
//! sequence (spec.md §4.1). One engine instance per target database; at
//! most one run active per database at a time (`AlreadyRunning`).
//!
//! The bootstrap step seeds a `NormalizedItem` row for every `CatalogItem`
//! that does not have one yet, then the generic runner loops each stage to
//! exhaustion (`find_pending_for_stage` → `run_batch` → `save_batch`)
//! before moving to the next. A `PipelineRunAggregate` is kept per call to
//! `start`; its `upload_id` field doubles as an opaque run identifier for
//! traceability in the event log rather than restricting the scan to one
//! upload's items — the aggregate's only constructor takes an `UploadId`,
//! and a db-wide run still needs *some* identifier to tag its events with.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

use catalog_domain::aggregates::{PipelineRunAggregate, RunState, StageCounters};
use catalog_domain::cancellation::CancellationToken;
use catalog_domain::error::CatalogError;
use catalog_domain::repositories::{CatalogItemRepository, NormalizedItemRepository, UploadRepository};
use catalog_domain::services::StageService;
use catalog_domain::value_objects::{NormalizedItemId, UploadId};

use crate::infrastructure::retry::{with_backoff, RetryPolicy};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub run_id: UploadId,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub running: bool,
    pub state: Option<RunState>,
    pub per_stage: HashMap<String, StageCounters>,
    pub final_rows: usize,
}

struct ActiveRun {
    cancel: CancellationToken,
    events: Mutex<Vec<String>>,
}

pub struct PipelineEngine {
    catalog_items: Arc<dyn CatalogItemRepository>,
    normalized_items: Arc<dyn NormalizedItemRepository>,
    uploads: Arc<dyn UploadRepository>,
    stages: Vec<Arc<dyn StageService>>,
    batch_size: usize,
    retry_policy: RetryPolicy,
    events_buffer_size: usize,
    locks: Mutex<HashSet<String>>,
    active: Mutex<HashMap<String, Arc<ActiveRun>>>,
    last_status: Mutex<HashMap<String, PipelineStatus>>,
}

impl PipelineEngine {
    pub fn new(
        catalog_items: Arc<dyn CatalogItemRepository>,
        normalized_items: Arc<dyn NormalizedItemRepository>,
        uploads: Arc<dyn UploadRepository>,
        stages: Vec<Arc<dyn StageService>>,
        batch_size: usize,
        retry_policy: RetryPolicy,
        events_buffer_size: usize,
    ) -> Self {
        Self {
            catalog_items,
            normalized_items,
            uploads,
            stages,
            batch_size,
            retry_policy,
            events_buffer_size,
            locks: Mutex::new(HashSet::new()),
            active: Mutex::new(HashMap::new()),
            last_status: Mutex::new(HashMap::new()),
        }
    }

    fn try_acquire(&self, db_ref: &str, run: Arc<ActiveRun>) -> Result<(), CatalogError> {
        let mut locks = self.locks.lock();
        if !locks.insert(db_ref.to_string()) {
            return Err(CatalogError::already_running(format!("pipeline already running for database {db_ref}")));
        }
        self.active.lock().insert(db_ref.to_string(), run);
        Ok(())
    }

    fn release(&self, db_ref: &str) {
        self.locks.lock().remove(db_ref);
        self.active.lock().remove(db_ref);
    }

    fn push_event(&self, db_ref: &str, message: impl Into<String>) {
        if let Some(run) = self.active.lock().get(db_ref) {
            let mut events = run.events.lock();
            if events.len() >= self.events_buffer_size {
                events.remove(0);
            }
            events.push(message.into());
        }
    }

    /// Seeds a `NormalizedItem` for every `CatalogItem` across every
    /// upload that doesn't have one yet.
    async fn bootstrap(&self) -> Result<usize, CatalogError> {
        let mut seeded = 0;
        let uploads = self.uploads.list_paginated(0, usize::MAX / 2).await?;
        for upload in uploads {
            for item in self.catalog_items.find_by_upload(upload.id()).await? {
                if self.normalized_items.find_by_source_item(item.id()).await?.is_empty() {
                    let normalized = catalog_domain::entities::NormalizedItem::new(
                        item.id(),
                        item.external_reference(),
                        item.raw_name(),
                        item.raw_name(),
                    );
                    self.normalized_items.save(&normalized).await?;
                    seeded += 1;
                }
            }
        }
        Ok(seeded)
    }

    /// Starts a run against `db_ref`. Fails fast with `AlreadyRunning` if
    /// a run for the same `db_ref` is already in flight.
    pub async fn start(&self, db_ref: &str, options: PipelineOptions) -> Result<PipelineRunAggregate, CatalogError> {
        let run = Arc::new(ActiveRun { cancel: options.cancel.clone(), events: Mutex::new(Vec::new()) });
        self.try_acquire(db_ref, run)?;
        let result = self.drive(db_ref, options).await;
        self.release(db_ref);
        result
    }

    async fn drive(&self, db_ref: &str, options: PipelineOptions) -> Result<PipelineRunAggregate, CatalogError> {
        let mut aggregate = PipelineRunAggregate::new(options.run_id);
        aggregate.start(Utc::now())?;
        info!(upload_id = %options.run_id, db_ref, "pipeline run started");

        let seeded = self.bootstrap().await?;
        self.push_event(db_ref, format!("bootstrap: seeded {seeded} normalized rows"));

        'stages: for stage in &self.stages {
            loop {
                if options.cancel.is_cancelled() {
                    aggregate.cancel(Utc::now())?;
                    self.push_event(db_ref, format!("cancelled during {}", stage.name()));
                    break 'stages;
                }

                let stage_name = stage.name();
                let batch_size = self.batch_size;
                let normalized_items = Arc::clone(&self.normalized_items);
                let batch = with_backoff(&self.retry_policy, || {
                    let normalized_items = Arc::clone(&normalized_items);
                    async move { normalized_items.find_pending_for_stage(stage_name, batch_size).await }
                })
                .await?;

                if batch.is_empty() {
                    break;
                }

                let before: HashMap<NormalizedItemId, Option<String>> =
                    batch.iter().map(|item| (item.id(), item.stages().last_error.clone())).collect();
                let batch_len = batch.len();

                let out = stage.run_batch(batch).await?;

                let normalized_items = Arc::clone(&self.normalized_items);
                let to_save = out.clone();
                with_backoff(&self.retry_policy, || {
                    let normalized_items = Arc::clone(&normalized_items);
                    let to_save = to_save.clone();
                    async move { normalized_items.save_batch(&to_save).await }
                })
                .await?;

                let mut errors = 0;
                for item in &out {
                    let prior = before.get(&item.id()).cloned().flatten();
                    if let Some(message) = item.stages().last_error.clone() {
                        if Some(&message) != prior.as_ref() {
                            aggregate.record_item_error(item.source_item_id(), stage.name(), message.clone(), Utc::now());
                            warn!(
                                upload_id = %options.run_id,
                                item_id = %item.source_item_id(),
                                stage = stage.name(),
                                error = message,
                                "item failed stage"
                            );
                            errors += 1;
                        }
                    }
                }

                aggregate.complete_stage_batch(stage.name(), (batch_len.saturating_sub(errors)) as u32, Utc::now());
                info!(
                    upload_id = %options.run_id,
                    stage = stage.name(),
                    processed = batch_len,
                    errors,
                    "stage batch completed"
                );
                self.push_event(db_ref, format!("{}: processed {batch_len} ({errors} errors)", stage.name()));
            }
        }

        if aggregate.is_running() {
            aggregate.complete(Utc::now())?;
            info!(upload_id = %options.run_id, db_ref, "pipeline run completed");
            self.push_event(db_ref, "run completed");
        }

        let status = PipelineStatus {
            running: false,
            state: aggregate.state(),
            per_stage: self.stages.iter().map(|s| (s.name().to_string(), aggregate.stage_counters(s.name()))).collect(),
            final_rows: self.normalized_items.count_final().await.unwrap_or(0),
        };
        self.last_status.lock().insert(db_ref.to_string(), status);

        Ok(aggregate)
    }

    /// Cooperatively requests cancellation of the run against `db_ref`, if
    /// one is active. In-flight batches finish before the run stops.
    pub fn stop(&self, db_ref: &str) -> bool {
        if let Some(run) = self.active.lock().get(db_ref) {
            run.cancel.cancel();
            true
        } else {
            false
        }
    }

    pub fn is_running(&self, db_ref: &str) -> bool {
        self.locks.lock().contains(db_ref)
    }

    pub async fn status(&self, db_ref: &str) -> PipelineStatus {
        let running = self.is_running(db_ref);
        if running {
            PipelineStatus {
                running: true,
                state: Some(RunState::Running),
                per_stage: HashMap::new(),
                final_rows: self.normalized_items.count_final().await.unwrap_or(0),
            }
        } else {
            self.last_status.lock().get(db_ref).cloned().unwrap_or(PipelineStatus {
                running: false,
                state: None,
                per_stage: HashMap::new(),
                final_rows: 0,
            })
        }
    }

    /// Drains the progress log accumulated by the active (or most
    /// recently finished) run against `db_ref`, bounded by
    /// `normalizer_events_buffer_size` with drop-on-overflow — counters on
    /// `PipelineRunAggregate` remain authoritative regardless of what this
    /// log retains.
    pub fn events(&self, db_ref: &str) -> Vec<String> {
        self.active.lock().get(db_ref).map(|run| run.events.lock().clone()).unwrap_or_default()
    }

    /// Streams the same progress messages as `events` over an
    /// `mpsc::Receiver`, for callers that want push notifications rather
    /// than polling. The sender is dropped (closing the stream) once this
    /// snapshot has been flushed, since this is a point-in-time replay,
    /// not a live subscription.
    pub fn events_stream(&self, db_ref: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.events_buffer_size.max(1));
        for message in self.events(db_ref) {
            let _ = tx.try_send(message);
        }
        rx
    }
}
