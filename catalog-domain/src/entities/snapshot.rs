//! # Snapshot Entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::value_objects::{SnapshotId, UploadId};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum SnapshotType {
    Manual,
    AutoLatest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMembership {
    pub upload_id: UploadId,
    pub iteration_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    id: SnapshotId,
    name: String,
    description: Option<String>,
    snapshot_type: SnapshotType,
    project_ref: String,
    client_ref: Option<String>,
    created_at: DateTime<Utc>,
    memberships: Vec<SnapshotMembership>,
}

impl Snapshot {
    /// Creates a snapshot, assigning iteration indices `0..N` in the
    /// given upload order. Fails validation if `uploads` is empty, since
    /// an empty snapshot has no iterations to compare.
    pub fn create(
        name: impl Into<String>,
        description: Option<String>,
        snapshot_type: SnapshotType,
        project_ref: impl Into<String>,
        client_ref: Option<String>,
        uploads: Vec<UploadId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CatalogError> {
        if uploads.is_empty() {
            return Err(CatalogError::validation("snapshot requires at least one upload"));
        }
        let memberships = uploads
            .into_iter()
            .enumerate()
            .map(|(i, upload_id)| SnapshotMembership {
                upload_id,
                iteration_index: i as u32,
            })
            .collect();
        Ok(Self {
            id: SnapshotId::new(),
            name: name.into(),
            description,
            snapshot_type,
            project_ref: project_ref.into(),
            client_ref,
            created_at,
            memberships,
        })
    }

    /// Reconstructs a snapshot from stored state, for repository adapters
    /// reading a row back. Bypasses the non-empty-uploads validation done
    /// by `create`, since the row was already validated on write.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: SnapshotId,
        name: String,
        description: Option<String>,
        snapshot_type: SnapshotType,
        project_ref: String,
        client_ref: Option<String>,
        created_at: DateTime<Utc>,
        memberships: Vec<SnapshotMembership>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            snapshot_type,
            project_ref,
            client_ref,
            created_at,
            memberships,
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn project_ref(&self) -> &str {
        &self.project_ref
    }

    pub fn client_ref(&self) -> Option<&str> {
        self.client_ref.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn snapshot_type(&self) -> SnapshotType {
        self.snapshot_type
    }

    pub fn memberships(&self) -> &[SnapshotMembership] {
        &self.memberships
    }

    pub fn iteration_count(&self) -> usize {
        self.memberships.len()
    }

    /// Invariant check: iteration indices form `0..N` without gaps.
    pub fn has_contiguous_iterations(&self) -> bool {
        let mut indices: Vec<u32> = self.memberships.iter().map(|m| m.iteration_index).collect();
        indices.sort_unstable();
        indices.iter().enumerate().all(|(i, &idx)| i as u32 == idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterations_are_contiguous_in_upload_order() {
        let snapshot = Snapshot::create(
            "weekly",
            None,
            SnapshotType::Manual,
            "proj-1",
            None,
            vec![UploadId::new(), UploadId::new(), UploadId::new()],
            Utc::now(),
        )
        .unwrap();
        assert!(snapshot.has_contiguous_iterations());
        assert_eq!(snapshot.iteration_count(), 3);
    }

    #[test]
    fn empty_upload_list_is_rejected() {
        assert!(Snapshot::create(
            "empty",
            None,
            SnapshotType::Manual,
            "proj-1",
            None,
            vec![],
            Utc::now()
        )
        .is_err());
    }
}
