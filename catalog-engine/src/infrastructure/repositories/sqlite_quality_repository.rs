//! # SQLite Quality Repository Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use catalog_domain::entities::{Assessment, DuplicateGroup, Severity, Suggestion, Violation, ViolationKind};
use catalog_domain::repositories::QualityRepository;
use catalog_domain::value_objects::{AssessmentId, Confidence, DuplicateGroupId, NormalizedItemId, SimilarityScore};
use catalog_domain::CatalogError;

pub struct SqliteQualityRepository {
    pool: SqlitePool,
}

impl SqliteQualityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn severity_str(s: Severity) -> &'static str {
        match s {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    fn severity_from_str(s: &str) -> Severity {
        match s {
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Low,
        }
    }

    fn violation_kind_str(k: ViolationKind) -> &'static str {
        match k {
            ViolationKind::EmptyName => "empty_name",
            ViolationKind::NonLatinInCode => "non_latin_in_code",
            ViolationKind::CodeNotInTaxonomy => "code_not_in_taxonomy",
            ViolationKind::ConfidenceBelowFloor => "confidence_below_floor",
            ViolationKind::MergedCountOfOneButMarkedMerged => "merged_count_of_one_but_marked_merged",
        }
    }

    fn violation_kind_from_str(s: &str) -> ViolationKind {
        match s {
            "non_latin_in_code" => ViolationKind::NonLatinInCode,
            "code_not_in_taxonomy" => ViolationKind::CodeNotInTaxonomy,
            "confidence_below_floor" => ViolationKind::ConfidenceBelowFloor,
            "merged_count_of_one_but_marked_merged" => ViolationKind::MergedCountOfOneButMarkedMerged,
            _ => ViolationKind::EmptyName,
        }
    }
}

#[async_trait]
impl QualityRepository for SqliteQualityRepository {
    async fn save_assessment(&self, assessment: &Assessment) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO quality_assessments
                (id, table_name, started_at, completed_at, rows_scanned, duplicate_groups_found,
                 violations_found, suggestions_found)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                completed_at = excluded.completed_at,
                rows_scanned = excluded.rows_scanned,
                duplicate_groups_found = excluded.duplicate_groups_found,
                violations_found = excluded.violations_found,
                suggestions_found = excluded.suggestions_found",
        )
        .bind(assessment.id.to_string())
        .bind(&assessment.table)
        .bind(assessment.started_at.to_rfc3339())
        .bind(assessment.completed_at.map(|t| t.to_rfc3339()))
        .bind(assessment.rows_scanned as i64)
        .bind(assessment.duplicate_groups_found as i64)
        .bind(assessment.violations_found as i64)
        .bind(assessment.suggestions_found as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save assessment: {e}")))?;
        Ok(())
    }

    async fn find_assessment(&self, id: AssessmentId) -> Result<Option<Assessment>, CatalogError> {
        let row = sqlx::query("SELECT * FROM quality_assessments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find assessment: {e}")))?;
        row.map(|row| -> Result<Assessment, CatalogError> {
            let id = AssessmentId::from_string(&row.get::<String, _>("id"))?;
            let started_at: DateTime<Utc> = row
                .get::<String, _>("started_at")
                .parse()
                .map_err(|e| CatalogError::database_error(format!("corrupt started_at: {e}")))?;
            let completed_at: Option<String> = row.get("completed_at");
            let completed_at = completed_at
                .map(|s| s.parse::<DateTime<Utc>>())
                .transpose()
                .map_err(|e| CatalogError::database_error(format!("corrupt completed_at: {e}")))?;
            Ok(Assessment {
                id,
                table: row.get::<String, _>("table_name"),
                started_at,
                completed_at,
                rows_scanned: row.get::<i64, _>("rows_scanned") as u64,
                duplicate_groups_found: row.get::<i64, _>("duplicate_groups_found") as u64,
                violations_found: row.get::<i64, _>("violations_found") as u64,
                suggestions_found: row.get::<i64, _>("suggestions_found") as u64,
            })
        })
        .transpose()
    }

    async fn save_duplicate_group(&self, group: &DuplicateGroup) -> Result<(), CatalogError> {
        let member_ids_json = serde_json::to_string(&group.member_ids)?;
        sqlx::query(
            "INSERT INTO duplicate_groups (id, member_ids_json, suggested_master_id, similarity)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                member_ids_json = excluded.member_ids_json,
                suggested_master_id = excluded.suggested_master_id,
                similarity = excluded.similarity",
        )
        .bind(group.id.to_string())
        .bind(member_ids_json)
        .bind(group.suggested_master_id.to_string())
        .bind(group.similarity.value() as f64)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save duplicate group: {e}")))?;
        Ok(())
    }

    async fn find_duplicate_group(&self, id: DuplicateGroupId) -> Result<Option<DuplicateGroup>, CatalogError> {
        let row = sqlx::query("SELECT * FROM duplicate_groups WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find duplicate group: {e}")))?;
        row.map(row_to_duplicate_group).transpose()
    }

    async fn list_duplicate_groups(&self) -> Result<Vec<DuplicateGroup>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM duplicate_groups")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to list duplicate groups: {e}")))?;
        rows.into_iter().map(row_to_duplicate_group).collect()
    }

    async fn save_violation(&self, violation: &Violation) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO quality_violations (id, normalized_item_id, kind, severity, detail, resolved, resolved_by)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET resolved = excluded.resolved, resolved_by = excluded.resolved_by",
        )
        .bind(violation.id.to_string())
        .bind(violation.normalized_item_id.to_string())
        .bind(Self::violation_kind_str(violation.kind))
        .bind(Self::severity_str(violation.severity))
        .bind(&violation.detail)
        .bind(violation.resolved as i64)
        .bind(&violation.resolved_by)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save violation: {e}")))?;
        Ok(())
    }

    async fn find_violation(&self, id: Uuid) -> Result<Option<Violation>, CatalogError> {
        let row = sqlx::query("SELECT * FROM quality_violations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find violation: {e}")))?;
        row.map(row_to_violation).transpose()
    }

    async fn update_violation(&self, violation: &Violation) -> Result<(), CatalogError> {
        self.save_violation(violation).await
    }

    async fn list_unresolved_violations(&self) -> Result<Vec<Violation>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM quality_violations WHERE resolved = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to list unresolved violations: {e}")))?;
        rows.into_iter().map(row_to_violation).collect()
    }

    async fn save_suggestion(&self, suggestion: &Suggestion) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO quality_suggestions (id, normalized_item_id, suggested_name, suggested_code, confidence, applied)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET applied = excluded.applied",
        )
        .bind(suggestion.id.to_string())
        .bind(suggestion.normalized_item_id.to_string())
        .bind(&suggestion.suggested_name)
        .bind(&suggestion.suggested_code)
        .bind(suggestion.confidence.value() as f64)
        .bind(suggestion.applied as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save suggestion: {e}")))?;
        Ok(())
    }

    async fn find_suggestion(&self, id: Uuid) -> Result<Option<Suggestion>, CatalogError> {
        let row = sqlx::query("SELECT * FROM quality_suggestions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find suggestion: {e}")))?;
        row.map(row_to_suggestion).transpose()
    }

    async fn update_suggestion(&self, suggestion: &Suggestion) -> Result<(), CatalogError> {
        self.save_suggestion(suggestion).await
    }

    async fn list_unapplied_suggestions(&self) -> Result<Vec<Suggestion>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM quality_suggestions WHERE applied = 0")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to list unapplied suggestions: {e}")))?;
        rows.into_iter().map(row_to_suggestion).collect()
    }
}

fn row_to_duplicate_group(row: sqlx::sqlite::SqliteRow) -> Result<DuplicateGroup, CatalogError> {
    let id = DuplicateGroupId::from_string(&row.get::<String, _>("id"))?;
    let member_ids_json: String = row.get("member_ids_json");
    let member_ids: Vec<NormalizedItemId> = serde_json::from_str(&member_ids_json)?;
    let suggested_master_id = NormalizedItemId::from_string(&row.get::<String, _>("suggested_master_id"))?;
    Ok(DuplicateGroup {
        id,
        member_ids,
        suggested_master_id,
        similarity: SimilarityScore::new(row.get::<f64, _>("similarity") as f32),
    })
}

fn row_to_violation(row: sqlx::sqlite::SqliteRow) -> Result<Violation, CatalogError> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id).map_err(|e| CatalogError::database_error(format!("corrupt violation id: {e}")))?;
    let normalized_item_id = NormalizedItemId::from_string(&row.get::<String, _>("normalized_item_id"))?;
    Ok(Violation {
        id,
        normalized_item_id,
        kind: SqliteQualityRepository::violation_kind_from_str(&row.get::<String, _>("kind")),
        severity: SqliteQualityRepository::severity_from_str(&row.get::<String, _>("severity")),
        detail: row.get::<String, _>("detail"),
        resolved: row.get::<i64, _>("resolved") != 0,
        resolved_by: row.get::<Option<String>, _>("resolved_by"),
    })
}

fn row_to_suggestion(row: sqlx::sqlite::SqliteRow) -> Result<Suggestion, CatalogError> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id).map_err(|e| CatalogError::database_error(format!("corrupt suggestion id: {e}")))?;
    let normalized_item_id = NormalizedItemId::from_string(&row.get::<String, _>("normalized_item_id"))?;
    Ok(Suggestion {
        id,
        normalized_item_id,
        suggested_name: row.get::<String, _>("suggested_name"),
        suggested_code: row.get::<String, _>("suggested_code"),
        confidence: Confidence::new(row.get::<f64, _>("confidence") as f32),
        applied: row.get::<i64, _>("applied") != 0,
    })
}
