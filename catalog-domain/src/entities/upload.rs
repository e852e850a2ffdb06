//! # Upload Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::value_objects::UploadId;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum UploadStatus {
    InProgress,
    Complete,
    Failed,
}

/// A single ingestion event: the envelope created at handshake and closed
/// on explicit completion. Immutable once `status != InProgress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    id: UploadId,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    status: UploadStatus,
    constants_count: u64,
    catalogs_count: u64,
    items_count: u64,
}

impl Upload {
    /// Creates a new upload in `InProgress` status, as produced by the
    /// ingest handshake.
    pub fn handshake(started_at: DateTime<Utc>) -> Self {
        Self {
            id: UploadId::new(),
            started_at,
            ended_at: None,
            status: UploadStatus::InProgress,
            constants_count: 0,
            catalogs_count: 0,
            items_count: 0,
        }
    }

    pub fn from_parts(
        id: UploadId,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
        status: UploadStatus,
        constants_count: u64,
        catalogs_count: u64,
        items_count: u64,
    ) -> Self {
        Self {
            id,
            started_at,
            ended_at,
            status,
            constants_count,
            catalogs_count,
            items_count,
        }
    }

    pub fn id(&self) -> UploadId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == UploadStatus::Complete
    }

    pub fn items_count(&self) -> u64 {
        self.items_count
    }

    pub fn record_constant(&mut self) -> Result<(), CatalogError> {
        self.ensure_in_progress()?;
        self.constants_count += 1;
        Ok(())
    }

    pub fn record_catalog(&mut self) -> Result<(), CatalogError> {
        self.ensure_in_progress()?;
        self.catalogs_count += 1;
        Ok(())
    }

    pub fn record_item(&mut self) -> Result<(), CatalogError> {
        self.ensure_in_progress()?;
        self.items_count += 1;
        Ok(())
    }

    /// Closes the upload; rejected if already closed, matching the
    /// "further record posts for the UUID are rejected" rule in §6.
    pub fn complete(&mut self, ended_at: DateTime<Utc>) -> Result<(), CatalogError> {
        self.ensure_in_progress()?;
        self.status = UploadStatus::Complete;
        self.ended_at = Some(ended_at);
        Ok(())
    }

    pub fn fail(&mut self, ended_at: DateTime<Utc>) -> Result<(), CatalogError> {
        self.ensure_in_progress()?;
        self.status = UploadStatus::Failed;
        self.ended_at = Some(ended_at);
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<(), CatalogError> {
        if self.status != UploadStatus::InProgress {
            return Err(CatalogError::validation(format!(
                "upload {} is no longer in progress",
                self.id
            )));
        }
        Ok(())
    }
}
