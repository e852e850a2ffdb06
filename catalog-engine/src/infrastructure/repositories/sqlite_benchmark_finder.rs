//! # SQLite Benchmark Finder
//!
//! Backs the domain's `BenchmarkFinder` capability (spec.md §4.1, §4.4)
//! with a table of human-curated `(name, code)` references. The set of
//! benchmarks is expected to be small (curated, not bulk data), so
//! `find_closest` does a full scan scored by the injected
//! `SimilarityService` rather than maintaining its own index.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use catalog_domain::services::{BenchmarkFinder, BenchmarkMatch, SimilarityCandidate, SimilarityService};
use catalog_domain::value_objects::SimilarityScore;
use catalog_domain::CatalogError;

pub struct SqliteBenchmarkFinder {
    pool: SqlitePool,
    similarity: Arc<dyn SimilarityService>,
}

impl SqliteBenchmarkFinder {
    pub fn new(pool: SqlitePool, similarity: Arc<dyn SimilarityService>) -> Self {
        Self { pool, similarity }
    }

    pub async fn register(&self, name: &str, code: &str) -> Result<(), CatalogError> {
        sqlx::query("INSERT INTO benchmarks (id, name, code) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to register benchmark: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl BenchmarkFinder for SqliteBenchmarkFinder {
    async fn find_closest(&self, name: &str) -> Option<BenchmarkMatch> {
        let rows = sqlx::query("SELECT name, code FROM benchmarks")
            .fetch_all(&self.pool)
            .await
            .ok()?;

        let candidate = SimilarityCandidate {
            normalized_name: name.to_string(),
            attributes: vec![],
        };

        let mut best: Option<(String, String, SimilarityScore)> = None;
        for row in rows {
            let benchmark_name: String = row.get("name");
            let benchmark_code: String = row.get("code");
            let benchmark_candidate = SimilarityCandidate {
                normalized_name: benchmark_name.clone(),
                attributes: vec![],
            };
            let score = self.similarity.similarity(&candidate, &benchmark_candidate).await;
            let better = match &best {
                Some((_, _, best_score)) => score.value() > best_score.value(),
                None => true,
            };
            if better {
                best = Some((benchmark_name, benchmark_code, score));
            }
        }

        best.map(|(name, code, similarity)| BenchmarkMatch { name, code, similarity })
    }
}
