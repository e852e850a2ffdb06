//! # Schema
//!
//! Schema-on-connect for the two SQLite stores named in spec.md §6: the
//! main store (uploads/catalog items/normalized output/snapshots/quality
//! artifacts) and the service store (classifier taxonomy, provider
//! registrations — shared across databases). Grounded on the teacher's
//! `sqlite_pipeline_repository_adapter.rs::new`, which normalizes a path
//! into a sqlx URL and runs its schema migration on first connect.

use catalog_domain::CatalogError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

fn database_url(path: &str) -> String {
    if path == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{path}")
    }
}

async fn open_pool(path: &str) -> Result<SqlitePool, CatalogError> {
    let url = database_url(path);
    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| CatalogError::database_error(format!("invalid database path {path}: {e}")))?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to open {path}: {e}")))
}

pub async fn initialize_main_store(path: &str) -> Result<SqlitePool, CatalogError> {
    let pool = open_pool(path).await?;
    sqlx::query(MAIN_SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to initialize main schema: {e}")))?;
    tracing::debug!(path, "main store schema initialized");
    Ok(pool)
}

pub async fn initialize_service_store(path: &str) -> Result<SqlitePool, CatalogError> {
    let pool = open_pool(path).await?;
    sqlx::query(SERVICE_SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to initialize service schema: {e}")))?;
    tracing::debug!(path, "service store schema initialized");
    Ok(pool)
}

const MAIN_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS uploads (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    status TEXT NOT NULL,
    constants_count INTEGER NOT NULL DEFAULT 0,
    catalogs_count INTEGER NOT NULL DEFAULT 0,
    items_count INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_uploads_started_at ON uploads(started_at DESC);

CREATE TABLE IF NOT EXISTS catalog_items (
    id TEXT PRIMARY KEY,
    upload_id TEXT NOT NULL REFERENCES uploads(id),
    external_reference TEXT NOT NULL,
    external_code TEXT,
    raw_name TEXT NOT NULL,
    attributes TEXT NOT NULL,
    table_parts TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(upload_id, external_reference)
);
CREATE INDEX IF NOT EXISTS idx_catalog_items_upload ON catalog_items(upload_id);

CREATE TABLE IF NOT EXISTS normalized_data (
    id TEXT PRIMARY KEY,
    source_item_id TEXT NOT NULL,
    source_reference TEXT NOT NULL,
    normalized_name TEXT NOT NULL,
    normalized_reference TEXT NOT NULL,
    category_label TEXT,
    merged_count INTEGER NOT NULL DEFAULT 1,
    taxonomy_code TEXT,
    taxonomy_name TEXT,
    confidence REAL NOT NULL DEFAULT 0,
    processing_level TEXT NOT NULL DEFAULT 'basic',
    ai_reasoning TEXT,
    stages_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_normalized_reference ON normalized_data(normalized_reference);
CREATE INDEX IF NOT EXISTS idx_normalized_source_item ON normalized_data(source_item_id);

CREATE TABLE IF NOT EXISTS snapshots (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    snapshot_type TEXT NOT NULL,
    project_ref TEXT NOT NULL,
    client_ref TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshot_uploads (
    snapshot_id TEXT NOT NULL REFERENCES snapshots(id),
    upload_id TEXT NOT NULL,
    iteration_index INTEGER NOT NULL,
    PRIMARY KEY (snapshot_id, upload_id)
);

CREATE TABLE IF NOT EXISTS normalized_counterparties (
    id TEXT PRIMARY KEY,
    tax_id TEXT NOT NULL,
    secondary_tax_id TEXT,
    legal_form TEXT,
    legal_address TEXT,
    postal_address TEXT,
    phone TEXT,
    email TEXT,
    bank_account_number TEXT,
    bank_name TEXT,
    bic TEXT,
    subcategory TEXT,
    enrichment_source TEXT,
    quality_score REAL NOT NULL DEFAULT 0,
    edited_manually_json TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX IF NOT EXISTS idx_counterparty_tax_id ON normalized_counterparties(tax_id);
CREATE INDEX IF NOT EXISTS idx_counterparty_secondary_tax_id ON normalized_counterparties(secondary_tax_id);

CREATE TABLE IF NOT EXISTS quality_assessments (
    id TEXT PRIMARY KEY,
    table_name TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    rows_scanned INTEGER NOT NULL DEFAULT 0,
    duplicate_groups_found INTEGER NOT NULL DEFAULT 0,
    violations_found INTEGER NOT NULL DEFAULT 0,
    suggestions_found INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS quality_violations (
    id TEXT PRIMARY KEY,
    normalized_item_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    severity TEXT NOT NULL,
    detail TEXT NOT NULL,
    resolved INTEGER NOT NULL DEFAULT 0,
    resolved_by TEXT
);
CREATE INDEX IF NOT EXISTS idx_violations_resolved ON quality_violations(resolved);

CREATE TABLE IF NOT EXISTS quality_suggestions (
    id TEXT PRIMARY KEY,
    normalized_item_id TEXT NOT NULL,
    suggested_name TEXT NOT NULL,
    suggested_code TEXT NOT NULL,
    confidence REAL NOT NULL,
    applied INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_suggestions_applied ON quality_suggestions(applied);

CREATE TABLE IF NOT EXISTS duplicate_groups (
    id TEXT PRIMARY KEY,
    member_ids_json TEXT NOT NULL,
    suggested_master_id TEXT NOT NULL,
    similarity REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS benchmarks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT NOT NULL
);
"#;

const SERVICE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS classifier_nodes (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    parent_code TEXT,
    level INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_classifier_parent ON classifier_nodes(parent_code);

CREATE TABLE IF NOT EXISTS providers (
    id TEXT PRIMARY KEY,
    provider_key TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    channels INTEGER NOT NULL DEFAULT 4,
    priority INTEGER NOT NULL DEFAULT 100,
    circuit_state TEXT NOT NULL DEFAULT 'closed',
    consecutive_failures INTEGER NOT NULL DEFAULT 0,
    cooldown_until TEXT,
    last_request_at TEXT
);
"#;
