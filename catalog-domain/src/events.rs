//! # Domain Events
//!
//! Events recorded by the `PipelineRunAggregate` as a run progresses.
//! Mirrors the teacher's `PipelineEvent` enum: one variant per state
//! transition the aggregate can undergo, replayable via `apply_event`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CatalogItemId, UploadId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CatalogEvent {
    RunStarted {
        upload_id: UploadId,
        at: DateTime<Utc>,
    },
    StageBatchCompleted {
        upload_id: UploadId,
        stage: String,
        items_processed: u32,
        at: DateTime<Utc>,
    },
    ItemErrored {
        upload_id: UploadId,
        item_id: CatalogItemId,
        stage: String,
        message: String,
        at: DateTime<Utc>,
    },
    RunCancelled {
        upload_id: UploadId,
        at: DateTime<Utc>,
    },
    RunCompleted {
        upload_id: UploadId,
        at: DateTime<Utc>,
    },
    RunFailed {
        upload_id: UploadId,
        reason: String,
        at: DateTime<Utc>,
    },
}
