//! # PipelineRunAggregate
//!
//! Event-sourced aggregate tracking a single pipeline run against one
//! upload's items. Grounded on the teacher's `PipelineAggregate`:
//! mutating methods append to `uncommitted_events` and call
//! `apply_event` to update in-memory state, so the same transition logic
//! drives both fresh construction and replay from a persisted event
//! stream.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::CatalogError;
use crate::events::CatalogEvent;
use crate::value_objects::UploadId;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RunState {
    Running,
    Cancelled,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct StageCounters {
    pub processed: u32,
    pub errors: u32,
}

#[derive(Debug, Clone)]
pub struct PipelineRunAggregate {
    upload_id: UploadId,
    version: u64,
    state: Option<RunState>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    per_stage: HashMap<String, StageCounters>,
    uncommitted_events: Vec<CatalogEvent>,
}

impl PipelineRunAggregate {
    pub fn new(upload_id: UploadId) -> Self {
        Self {
            upload_id,
            version: 0,
            state: None,
            started_at: None,
            ended_at: None,
            per_stage: HashMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Rebuilds aggregate state by replaying a persisted event stream,
    /// e.g. after a process restart.
    pub fn from_events(upload_id: UploadId, events: &[CatalogEvent]) -> Self {
        let mut aggregate = Self::new(upload_id);
        for event in events {
            aggregate.apply_event(event);
            aggregate.version += 1;
        }
        aggregate
    }

    pub fn upload_id(&self) -> UploadId {
        self.upload_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> Option<RunState> {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == Some(RunState::Running)
    }

    pub fn stage_counters(&self, stage: &str) -> StageCounters {
        self.per_stage.get(stage).cloned().unwrap_or_default()
    }

    pub fn uncommitted_events(&self) -> &[CatalogEvent] {
        &self.uncommitted_events
    }

    pub fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), CatalogError> {
        if self.state.is_some() {
            return Err(CatalogError::already_running(format!(
                "pipeline run already started for upload {}",
                self.upload_id
            )));
        }
        self.add_event(CatalogEvent::RunStarted {
            upload_id: self.upload_id,
            at,
        });
        Ok(())
    }

    pub fn complete_stage_batch(&mut self, stage: impl Into<String>, items_processed: u32, at: DateTime<Utc>) {
        self.add_event(CatalogEvent::StageBatchCompleted {
            upload_id: self.upload_id,
            stage: stage.into(),
            items_processed,
            at,
        });
    }

    pub fn record_item_error(
        &mut self,
        item_id: crate::value_objects::CatalogItemId,
        stage: impl Into<String>,
        message: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.add_event(CatalogEvent::ItemErrored {
            upload_id: self.upload_id,
            item_id,
            stage: stage.into(),
            message: message.into(),
            at,
        });
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), CatalogError> {
        if !self.is_running() {
            return Err(CatalogError::validation("run is not active"));
        }
        self.add_event(CatalogEvent::RunCancelled {
            upload_id: self.upload_id,
            at,
        });
        Ok(())
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), CatalogError> {
        if !self.is_running() {
            return Err(CatalogError::validation("run is not active"));
        }
        self.add_event(CatalogEvent::RunCompleted {
            upload_id: self.upload_id,
            at,
        });
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.add_event(CatalogEvent::RunFailed {
            upload_id: self.upload_id,
            reason: reason.into(),
            at,
        });
    }

    fn add_event(&mut self, event: CatalogEvent) {
        self.apply_event(&event);
        self.version += 1;
        self.uncommitted_events.push(event);
    }

    fn apply_event(&mut self, event: &CatalogEvent) {
        match event {
            CatalogEvent::RunStarted { at, .. } => {
                self.state = Some(RunState::Running);
                self.started_at = Some(*at);
            }
            CatalogEvent::StageBatchCompleted {
                stage, items_processed, ..
            } => {
                let counters = self.per_stage.entry(stage.clone()).or_default();
                counters.processed += items_processed;
            }
            CatalogEvent::ItemErrored { stage, .. } => {
                let counters = self.per_stage.entry(stage.clone()).or_default();
                counters.errors += 1;
            }
            CatalogEvent::RunCancelled { at, .. } => {
                self.state = Some(RunState::Cancelled);
                self.ended_at = Some(*at);
            }
            CatalogEvent::RunCompleted { at, .. } => {
                self.state = Some(RunState::Completed);
                self.ended_at = Some(*at);
            }
            CatalogEvent::RunFailed { at, .. } => {
                self.state = Some(RunState::Failed);
                self.ended_at = Some(*at);
            }
        }
    }
}
