//! # SQLite NormalizedItem Repository Adapter

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use catalog_domain::entities::NormalizedItem;
use catalog_domain::repositories::NormalizedItemRepository;
use catalog_domain::value_objects::{CatalogItemId, Confidence, NormalizedItemId, ProcessingLevel};
use catalog_domain::CatalogError;

pub struct SqliteNormalizedItemRepository {
    pool: SqlitePool,
}

impl SqliteNormalizedItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn save_one(&self, item: &NormalizedItem) -> Result<(), CatalogError> {
        let stages_json = serde_json::to_string(item.stages())?;
        sqlx::query(
            "INSERT INTO normalized_data
                (id, source_item_id, source_reference, normalized_name, normalized_reference,
                 category_label, merged_count, taxonomy_code, taxonomy_name, confidence,
                 processing_level, ai_reasoning, stages_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                normalized_name = excluded.normalized_name,
                normalized_reference = excluded.normalized_reference,
                category_label = excluded.category_label,
                merged_count = excluded.merged_count,
                taxonomy_code = excluded.taxonomy_code,
                taxonomy_name = excluded.taxonomy_name,
                confidence = excluded.confidence,
                processing_level = excluded.processing_level,
                ai_reasoning = excluded.ai_reasoning,
                stages_json = excluded.stages_json",
        )
        .bind(item.id().to_string())
        .bind(item.source_item_id().to_string())
        .bind(item.source_reference())
        .bind(item.normalized_name())
        .bind(item.normalized_reference())
        .bind(item.category_label())
        .bind(item.merged_count() as i64)
        .bind(item.taxonomy_code())
        .bind(item.taxonomy_name())
        .bind(item.confidence().value() as f64)
        .bind(item.processing_level().to_string())
        .bind(item.ai_reasoning())
        .bind(stages_json)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save normalized item: {e}")))?;
        Ok(())
    }

    fn row_to_item(row: sqlx::sqlite::SqliteRow) -> Result<NormalizedItem, CatalogError> {
        let stages_json: String = row.get("stages_json");
        let stages = serde_json::from_str(&stages_json)?;
        let id = NormalizedItemId::from_string(&row.get::<String, _>("id"))?;
        let source_item_id = CatalogItemId::from_string(&row.get::<String, _>("source_item_id"))?;
        let processing_level = ProcessingLevel::from_str(&row.get::<String, _>("processing_level"))?;
        let confidence = Confidence::new(row.get::<f64, _>("confidence") as f32);

        Ok(NormalizedItem::from_parts(
            id,
            source_item_id,
            row.get::<String, _>("source_reference"),
            row.get::<String, _>("normalized_name"),
            row.get::<String, _>("normalized_reference"),
            row.get::<Option<String>, _>("category_label"),
            row.get::<i64, _>("merged_count") as u32,
            row.get::<Option<String>, _>("taxonomy_code"),
            row.get::<Option<String>, _>("taxonomy_name"),
            confidence,
            processing_level,
            row.get::<Option<String>, _>("ai_reasoning"),
            stages,
        ))
    }
}

#[async_trait]
impl NormalizedItemRepository for SqliteNormalizedItemRepository {
    async fn save(&self, item: &NormalizedItem) -> Result<(), CatalogError> {
        self.save_one(item).await
    }

    async fn save_batch(&self, items: &[NormalizedItem]) -> Result<(), CatalogError> {
        for item in items {
            self.save_one(item).await?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: NormalizedItemId) -> Result<Option<NormalizedItem>, CatalogError> {
        let row = sqlx::query("SELECT * FROM normalized_data WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find normalized item: {e}")))?;
        row.map(Self::row_to_item).transpose()
    }

    async fn find_by_source_item(&self, source_item_id: CatalogItemId) -> Result<Vec<NormalizedItem>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM normalized_data WHERE source_item_id = ?")
            .bind(source_item_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to query normalized items: {e}")))?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_by_normalized_reference(&self, normalized_reference: &str) -> Result<Vec<NormalizedItem>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM normalized_data WHERE normalized_reference = ?")
            .bind(normalized_reference)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to query normalized group: {e}")))?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_pending_for_stage(&self, stage: &str, batch_size: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
        // `stage` is the full `StageFlags` field name, not a bare stage
        // number — see `CatalogItemRepository::find_pending_for_stage`.
        let sql = format!(
            "SELECT * FROM normalized_data WHERE json_extract(stages_json, '$.{stage}') IS NOT 1 LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(batch_size as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find pending normalized items: {e}")))?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_all_final(&self, offset: usize, limit: usize) -> Result<Vec<NormalizedItem>, CatalogError> {
        let rows = sqlx::query(
            "SELECT * FROM normalized_data WHERE json_extract(stages_json, '$.final_completed') = 1
             LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to list normalized items: {e}")))?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn count_final(&self) -> Result<usize, CatalogError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as c FROM normalized_data WHERE json_extract(stages_json, '$.final_completed') = 1",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to count normalized items: {e}")))?;
        let count: i64 = row.get("c");
        Ok(count as usize)
    }
}
