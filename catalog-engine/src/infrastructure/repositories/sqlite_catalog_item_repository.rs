//! # SQLite CatalogItem Repository Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use catalog_domain::entities::CatalogItem;
use catalog_domain::repositories::CatalogItemRepository;
use catalog_domain::value_objects::{CatalogItemId, UploadId};
use catalog_domain::CatalogError;

pub struct SqliteCatalogItemRepository {
    pool: SqlitePool,
}

impl SqliteCatalogItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: sqlx::sqlite::SqliteRow) -> Result<CatalogItem, CatalogError> {
        let upload_id: String = row.get("upload_id");
        let attributes: String = row.get("attributes");
        let table_parts: String = row.get("table_parts");
        let created_at: String = row.get("created_at");

        let attributes: HashMap<String, String> =
            serde_json::from_str(&attributes).map_err(|e| CatalogError::database_error(format!("corrupt attributes: {e}")))?;
        let table_parts: serde_json::Value =
            serde_json::from_str(&table_parts).map_err(|e| CatalogError::database_error(format!("corrupt table_parts: {e}")))?;
        let created_at: DateTime<Utc> = created_at
            .parse()
            .map_err(|e| CatalogError::database_error(format!("corrupt created_at: {e}")))?;

        Ok(CatalogItem::new(
            UploadId::from_string(&upload_id)?,
            row.get::<String, _>("external_reference"),
            row.get::<Option<String>, _>("external_code"),
            row.get::<String, _>("raw_name"),
            attributes,
            table_parts,
            created_at,
        ))
    }
}

#[async_trait]
impl CatalogItemRepository for SqliteCatalogItemRepository {
    async fn save(&self, item: &CatalogItem) -> Result<(), CatalogError> {
        let attributes = serde_json::to_string(item.attributes())?;
        let table_parts = serde_json::to_string(item.table_parts())?;
        sqlx::query(
            "INSERT INTO catalog_items (id, upload_id, external_reference, external_code, raw_name, attributes, table_parts, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(upload_id, external_reference) DO NOTHING",
        )
        .bind(item.id().to_string())
        .bind(item.upload_id().to_string())
        .bind(item.external_reference())
        .bind(item.external_code())
        .bind(item.raw_name())
        .bind(attributes)
        .bind(table_parts)
        .bind(item.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save catalog item: {e}")))?;
        Ok(())
    }

    async fn find_by_id(&self, id: CatalogItemId) -> Result<Option<CatalogItem>, CatalogError> {
        let row = sqlx::query(
            "SELECT id, upload_id, external_reference, external_code, raw_name, attributes, table_parts, created_at
             FROM catalog_items WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to find catalog item: {e}")))?;
        row.map(Self::row_to_item).transpose()
    }

    async fn find_by_upload(&self, upload_id: UploadId) -> Result<Vec<CatalogItem>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, upload_id, external_reference, external_code, raw_name, attributes, table_parts, created_at
             FROM catalog_items WHERE upload_id = ? ORDER BY created_at ASC",
        )
        .bind(upload_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to list catalog items: {e}")))?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_pending_for_stage(
        &self,
        upload_id: UploadId,
        stage: &str,
        batch_size: usize,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        // Pending == has no normalized row yet that completed `stage`. `stage`
        // is the full `StageFlags` field name (e.g. "stage05_completed",
        // "stage7_ai_processed", "final_completed") since not every stage
        // flag follows the `stageN_completed` naming pattern.
        let sql = format!(
            "SELECT ci.id, ci.upload_id, ci.external_reference, ci.external_code, ci.raw_name, ci.attributes, ci.table_parts, ci.created_at
             FROM catalog_items ci
             LEFT JOIN normalized_data nd ON nd.source_item_id = ci.id
             WHERE ci.upload_id = ?
               AND (nd.id IS NULL OR json_extract(nd.stages_json, '$.{stage}') IS NOT 1)
             LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(upload_id.to_string())
            .bind(batch_size as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find pending items: {e}")))?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn count_by_upload(&self, upload_id: UploadId) -> Result<usize, CatalogError> {
        let row = sqlx::query("SELECT COUNT(*) as c FROM catalog_items WHERE upload_id = ?")
            .bind(upload_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to count catalog items: {e}")))?;
        let count: i64 = row.get("c");
        Ok(count as usize)
    }
}
