//! # SQLite Snapshot Repository Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use catalog_domain::entities::{Snapshot, SnapshotMembership, SnapshotType};
use catalog_domain::repositories::SnapshotRepository;
use catalog_domain::value_objects::{SnapshotId, UploadId};
use catalog_domain::CatalogError;

pub struct SqliteSnapshotRepository {
    pool: SqlitePool,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn snapshot_type_str(t: SnapshotType) -> &'static str {
        match t {
            SnapshotType::Manual => "manual",
            SnapshotType::AutoLatest => "auto_latest",
        }
    }

    fn snapshot_type_from_str(s: &str) -> SnapshotType {
        match s {
            "auto_latest" => SnapshotType::AutoLatest,
            _ => SnapshotType::Manual,
        }
    }

    async fn load_memberships(&self, snapshot_id: SnapshotId) -> Result<Vec<SnapshotMembership>, CatalogError> {
        let rows = sqlx::query(
            "SELECT upload_id, iteration_index FROM snapshot_uploads WHERE snapshot_id = ? ORDER BY iteration_index ASC",
        )
        .bind(snapshot_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to load snapshot memberships: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let upload_id = UploadId::from_string(&row.get::<String, _>("upload_id"))?;
                Ok(SnapshotMembership {
                    upload_id,
                    iteration_index: row.get::<i64, _>("iteration_index") as u32,
                })
            })
            .collect()
    }

    async fn row_to_snapshot(&self, row: sqlx::sqlite::SqliteRow) -> Result<Snapshot, CatalogError> {
        let id = SnapshotId::from_string(&row.get::<String, _>("id"))?;
        let created_at: DateTime<Utc> = row
            .get::<String, _>("created_at")
            .parse()
            .map_err(|e| CatalogError::database_error(format!("corrupt created_at: {e}")))?;
        let memberships = self.load_memberships(id).await?;

        Ok(Snapshot::from_parts(
            id,
            row.get::<String, _>("name"),
            row.get::<Option<String>, _>("description"),
            Self::snapshot_type_from_str(&row.get::<String, _>("snapshot_type")),
            row.get::<String, _>("project_ref"),
            row.get::<Option<String>, _>("client_ref"),
            created_at,
            memberships,
        ))
    }
}

#[async_trait]
impl SnapshotRepository for SqliteSnapshotRepository {
    async fn save_atomic(&self, snapshot: &Snapshot) -> Result<(), CatalogError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to start snapshot transaction: {e}")))?;

        sqlx::query(
            "INSERT INTO snapshots (id, name, description, snapshot_type, project_ref, client_ref, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description",
        )
        .bind(snapshot.id().to_string())
        .bind(snapshot.name())
        .bind(snapshot.description())
        .bind(Self::snapshot_type_str(snapshot.snapshot_type()))
        .bind(snapshot.project_ref())
        .bind(snapshot.client_ref())
        .bind(snapshot.created_at().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to insert snapshot: {e}")))?;

        for membership in snapshot.memberships() {
            sqlx::query(
                "INSERT INTO snapshot_uploads (snapshot_id, upload_id, iteration_index)
                 VALUES (?, ?, ?)
                 ON CONFLICT(snapshot_id, upload_id) DO UPDATE SET iteration_index = excluded.iteration_index",
            )
            .bind(snapshot.id().to_string())
            .bind(membership.upload_id.to_string())
            .bind(membership.iteration_index as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to insert snapshot membership: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to commit snapshot transaction: {e}")))?;
        Ok(())
    }

    async fn find_by_id(&self, id: SnapshotId) -> Result<Option<Snapshot>, CatalogError> {
        let row = sqlx::query(
            "SELECT id, name, description, snapshot_type, project_ref, client_ref, created_at
             FROM snapshots WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to find snapshot: {e}")))?;
        match row {
            Some(row) => Ok(Some(self.row_to_snapshot(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_project(&self, project_ref: &str) -> Result<Vec<Snapshot>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, name, description, snapshot_type, project_ref, client_ref, created_at
             FROM snapshots WHERE project_ref = ? ORDER BY created_at DESC",
        )
        .bind(project_ref)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to list snapshots: {e}")))?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            snapshots.push(self.row_to_snapshot(row).await?);
        }
        Ok(snapshots)
    }
}
