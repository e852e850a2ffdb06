//! # SQLite Upload Repository Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use catalog_domain::entities::{Upload, UploadStatus};
use catalog_domain::repositories::UploadRepository;
use catalog_domain::value_objects::UploadId;
use catalog_domain::CatalogError;

pub struct SqliteUploadRepository {
    pool: SqlitePool,
}

impl SqliteUploadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn status_str(status: UploadStatus) -> &'static str {
        match status {
            UploadStatus::InProgress => "in_progress",
            UploadStatus::Complete => "complete",
            UploadStatus::Failed => "failed",
        }
    }

    fn status_from_str(s: &str) -> UploadStatus {
        match s {
            "complete" => UploadStatus::Complete,
            "failed" => UploadStatus::Failed,
            _ => UploadStatus::InProgress,
        }
    }

    fn row_to_upload(
        id: String,
        started_at: String,
        ended_at: Option<String>,
        status: String,
        constants_count: i64,
        catalogs_count: i64,
        items_count: i64,
    ) -> Result<Upload, CatalogError> {
        let id = UploadId::from_string(&id)?;
        let started_at: DateTime<Utc> = started_at
            .parse()
            .map_err(|e| CatalogError::database_error(format!("corrupt started_at: {e}")))?;
        let ended_at = ended_at
            .map(|s| s.parse::<DateTime<Utc>>())
            .transpose()
            .map_err(|e| CatalogError::database_error(format!("corrupt ended_at: {e}")))?;
        Ok(Upload::from_parts(
            id,
            started_at,
            ended_at,
            Self::status_from_str(&status),
            constants_count as u64,
            catalogs_count as u64,
            items_count as u64,
        ))
    }
}

#[async_trait]
impl UploadRepository for SqliteUploadRepository {
    async fn save(&self, upload: &Upload) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO uploads (id, started_at, ended_at, status, constants_count, catalogs_count, items_count)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET ended_at = excluded.ended_at, status = excluded.status,
                constants_count = excluded.constants_count, catalogs_count = excluded.catalogs_count,
                items_count = excluded.items_count",
        )
        .bind(upload.id().to_string())
        .bind(upload.started_at().to_rfc3339())
        .bind(upload.ended_at().map(|t| t.to_rfc3339()))
        .bind(Self::status_str(upload.status()))
        .bind(upload.items_count() as i64)
        .bind(0_i64)
        .bind(upload.items_count() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save upload: {e}")))?;
        Ok(())
    }

    async fn find_by_id(&self, id: UploadId) -> Result<Option<Upload>, CatalogError> {
        let row = sqlx::query(
            "SELECT id, started_at, ended_at, status, constants_count, catalogs_count, items_count
             FROM uploads WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to find upload: {e}")))?;

        row.map(|row| {
            Self::row_to_upload(
                row.get("id"),
                row.get("started_at"),
                row.get("ended_at"),
                row.get("status"),
                row.get("constants_count"),
                row.get("catalogs_count"),
                row.get("items_count"),
            )
        })
        .transpose()
    }

    async fn update(&self, upload: &Upload) -> Result<(), CatalogError> {
        self.save(upload).await
    }

    async fn list_paginated(&self, offset: usize, limit: usize) -> Result<Vec<Upload>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, started_at, ended_at, status, constants_count, catalogs_count, items_count
             FROM uploads ORDER BY started_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to list uploads: {e}")))?;

        rows.into_iter()
            .map(|row| {
                Self::row_to_upload(
                    row.get("id"),
                    row.get("started_at"),
                    row.get("ended_at"),
                    row.get("status"),
                    row.get("constants_count"),
                    row.get("catalogs_count"),
                    row.get("items_count"),
                )
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, CatalogError> {
        let row = sqlx::query("SELECT COUNT(*) as c FROM uploads")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to count uploads: {e}")))?;
        let count: i64 = row.get("c");
        Ok(count as usize)
    }
}
