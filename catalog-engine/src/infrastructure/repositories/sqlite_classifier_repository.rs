//! # SQLite Classifier Repository Adapter

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use catalog_domain::entities::ClassifierNode;
use catalog_domain::repositories::ClassifierRepository;
use catalog_domain::CatalogError;

pub struct SqliteClassifierRepository {
    pool: SqlitePool,
}

impl SqliteClassifierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_node(row: sqlx::sqlite::SqliteRow) -> ClassifierNode {
        ClassifierNode::new(
            row.get::<String, _>("code"),
            row.get::<String, _>("name"),
            row.get::<Option<String>, _>("parent_code"),
            row.get::<i64, _>("level") as u32,
        )
    }
}

#[async_trait]
impl ClassifierRepository for SqliteClassifierRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<ClassifierNode>, CatalogError> {
        let row = sqlx::query("SELECT code, name, parent_code, level FROM classifier_nodes WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find classifier node: {e}")))?;
        Ok(row.map(Self::row_to_node))
    }

    async fn children(&self, parent_code: Option<&str>) -> Result<Vec<ClassifierNode>, CatalogError> {
        let rows = match parent_code {
            Some(code) => {
                sqlx::query("SELECT code, name, parent_code, level FROM classifier_nodes WHERE parent_code = ? ORDER BY code")
                    .bind(code)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT code, name, parent_code, level FROM classifier_nodes WHERE parent_code IS NULL ORDER BY code")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| CatalogError::database_error(format!("failed to list classifier children: {e}")))?;
        Ok(rows.into_iter().map(Self::row_to_node).collect())
    }

    async fn save(&self, node: &ClassifierNode) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO classifier_nodes (code, name, parent_code, level)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET name = excluded.name, parent_code = excluded.parent_code, level = excluded.level",
        )
        .bind(node.code())
        .bind(node.name())
        .bind(node.parent_code())
        .bind(node.level() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save classifier node: {e}")))?;
        Ok(())
    }

    async fn validate_tree(&self) -> Result<(), CatalogError> {
        let rows = sqlx::query("SELECT code, name, parent_code, level FROM classifier_nodes")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to load classifier tree: {e}")))?;
        let nodes: Vec<ClassifierNode> = rows.into_iter().map(Self::row_to_node).collect();

        for node in &nodes {
            if !node.has_consistent_parent_shape() {
                return Err(CatalogError::validation(format!(
                    "classifier node {} has inconsistent parent shape for level {}",
                    node.code(),
                    node.level()
                )));
            }
            if let Some(parent_code) = node.parent_code() {
                let parent_ok = nodes
                    .iter()
                    .any(|candidate| candidate.code() == parent_code && candidate.level() + 1 == node.level());
                if !parent_ok {
                    return Err(CatalogError::validation(format!(
                        "classifier node {} references missing or misleveled parent {parent_code}",
                        node.code()
                    )));
                }
            }
        }
        Ok(())
    }
}
