//! # SQLite Provider Repository Adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use catalog_domain::entities::{CircuitState, Provider};
use catalog_domain::repositories::ProviderRepository;
use catalog_domain::value_objects::{ChannelCount, Priority, ProviderId};
use catalog_domain::CatalogError;

pub struct SqliteProviderRepository {
    pool: SqlitePool,
}

impl SqliteProviderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn circuit_state_str(state: CircuitState) -> &'static str {
        match state {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }

    fn circuit_state_from_str(s: &str) -> CircuitState {
        match s {
            "open" => CircuitState::Open,
            "half_open" => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    fn row_to_provider(row: sqlx::sqlite::SqliteRow) -> Result<Provider, CatalogError> {
        let id = ProviderId::from_string(&row.get::<String, _>("id"))?;
        let cooldown_until: Option<String> = row.get("cooldown_until");
        let cooldown_until = cooldown_until
            .map(|s| s.parse::<DateTime<Utc>>())
            .transpose()
            .map_err(|e| CatalogError::database_error(format!("corrupt cooldown_until: {e}")))?;
        let last_request_at: Option<String> = row.get("last_request_at");
        let last_request_at = last_request_at
            .map(|s| s.parse::<DateTime<Utc>>())
            .transpose()
            .map_err(|e| CatalogError::database_error(format!("corrupt last_request_at: {e}")))?;

        Ok(Provider::from_parts(
            id,
            row.get::<String, _>("provider_key"),
            row.get::<String, _>("display_name"),
            row.get::<i64, _>("enabled") != 0,
            ChannelCount::new(row.get::<i64, _>("channels") as usize),
            Priority::new(row.get::<i64, _>("priority") as u32),
            Self::circuit_state_from_str(&row.get::<String, _>("circuit_state")),
            row.get::<i64, _>("consecutive_failures") as u32,
            cooldown_until,
            last_request_at,
        ))
    }
}

#[async_trait]
impl ProviderRepository for SqliteProviderRepository {
    async fn upsert(&self, provider: &Provider) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO providers
                (id, provider_key, display_name, enabled, channels, priority, circuit_state,
                 consecutive_failures, cooldown_until, last_request_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(provider_key) DO UPDATE SET
                display_name = excluded.display_name,
                enabled = excluded.enabled,
                channels = excluded.channels,
                priority = excluded.priority,
                circuit_state = excluded.circuit_state,
                consecutive_failures = excluded.consecutive_failures,
                cooldown_until = excluded.cooldown_until,
                last_request_at = excluded.last_request_at",
        )
        .bind(provider.id().to_string())
        .bind(provider.provider_key())
        .bind(provider.display_name())
        .bind(provider.enabled() as i64)
        .bind(provider.channels().value() as i64)
        .bind(provider.priority().value() as i64)
        .bind(Self::circuit_state_str(provider.circuit_state()))
        .bind(provider.consecutive_failures() as i64)
        .bind(provider.cooldown_until().map(|t| t.to_rfc3339()))
        .bind(provider.last_request_at().map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to upsert provider: {e}")))?;
        Ok(())
    }

    async fn find_by_id(&self, id: ProviderId) -> Result<Option<Provider>, CatalogError> {
        let row = sqlx::query("SELECT * FROM providers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find provider: {e}")))?;
        row.map(Self::row_to_provider).transpose()
    }

    async fn find_by_key(&self, provider_key: &str) -> Result<Option<Provider>, CatalogError> {
        let row = sqlx::query("SELECT * FROM providers WHERE provider_key = ?")
            .bind(provider_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find provider by key: {e}")))?;
        row.map(Self::row_to_provider).transpose()
    }

    async fn list_enabled(&self) -> Result<Vec<Provider>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM providers WHERE enabled = 1 ORDER BY priority ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to list enabled providers: {e}")))?;
        rows.into_iter().map(Self::row_to_provider).collect()
    }

    async fn list_all(&self) -> Result<Vec<Provider>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM providers ORDER BY priority ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to list providers: {e}")))?;
        rows.into_iter().map(Self::row_to_provider).collect()
    }
}
