//! # SQLite Counterparty Repository Adapter

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

use catalog_domain::entities::{BankDetails, ContactDetails, NormalizedCounterparty};
use catalog_domain::repositories::CounterpartyRepository;
use catalog_domain::value_objects::{Confidence, CounterpartyId};
use catalog_domain::CatalogError;

pub struct SqliteCounterpartyRepository {
    pool: SqlitePool,
}

impl SqliteCounterpartyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_counterparty(row: sqlx::sqlite::SqliteRow) -> Result<NormalizedCounterparty, CatalogError> {
        let id = CounterpartyId::from_string(&row.get::<String, _>("id"))?;
        let edited_manually_json: String = row.get("edited_manually_json");
        let edited_manually: HashSet<String> = serde_json::from_str(&edited_manually_json)?;

        Ok(NormalizedCounterparty::from_parts(
            id,
            row.get::<String, _>("tax_id"),
            row.get::<Option<String>, _>("secondary_tax_id"),
            row.get::<Option<String>, _>("legal_form"),
            row.get::<Option<String>, _>("legal_address"),
            row.get::<Option<String>, _>("postal_address"),
            ContactDetails {
                phone: row.get::<Option<String>, _>("phone"),
                email: row.get::<Option<String>, _>("email"),
            },
            BankDetails {
                account_number: row.get::<Option<String>, _>("bank_account_number"),
                bank_name: row.get::<Option<String>, _>("bank_name"),
                bic: row.get::<Option<String>, _>("bic"),
            },
            row.get::<Option<String>, _>("subcategory"),
            row.get::<Option<String>, _>("enrichment_source"),
            Confidence::new(row.get::<f64, _>("quality_score") as f32),
            edited_manually,
        ))
    }
}

#[async_trait]
impl CounterpartyRepository for SqliteCounterpartyRepository {
    async fn save(&self, counterparty: &NormalizedCounterparty) -> Result<(), CatalogError> {
        let edited_manually_json = serde_json::to_string(counterparty.edited_manually())?;
        sqlx::query(
            "INSERT INTO normalized_counterparties
                (id, tax_id, secondary_tax_id, legal_form, legal_address, postal_address,
                 phone, email, bank_account_number, bank_name, bic, subcategory,
                 enrichment_source, quality_score, edited_manually_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                secondary_tax_id = excluded.secondary_tax_id,
                legal_form = excluded.legal_form,
                legal_address = excluded.legal_address,
                postal_address = excluded.postal_address,
                phone = excluded.phone,
                email = excluded.email,
                bank_account_number = excluded.bank_account_number,
                bank_name = excluded.bank_name,
                bic = excluded.bic,
                subcategory = excluded.subcategory,
                enrichment_source = excluded.enrichment_source,
                quality_score = excluded.quality_score,
                edited_manually_json = excluded.edited_manually_json",
        )
        .bind(counterparty.id().to_string())
        .bind(counterparty.tax_id())
        .bind(counterparty.secondary_tax_id())
        .bind(counterparty.legal_form())
        .bind(counterparty.legal_address())
        .bind(counterparty.postal_address())
        .bind(counterparty.contacts().phone.as_deref())
        .bind(counterparty.contacts().email.as_deref())
        .bind(counterparty.bank_details().account_number.as_deref())
        .bind(counterparty.bank_details().bank_name.as_deref())
        .bind(counterparty.bank_details().bic.as_deref())
        .bind(counterparty.subcategory())
        .bind(counterparty.enrichment_source())
        .bind(counterparty.quality_score().value() as f64)
        .bind(edited_manually_json)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::database_error(format!("failed to save counterparty: {e}")))?;
        Ok(())
    }

    async fn find_by_id(&self, id: CounterpartyId) -> Result<Option<NormalizedCounterparty>, CatalogError> {
        let row = sqlx::query("SELECT * FROM normalized_counterparties WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to find counterparty: {e}")))?;
        row.map(Self::row_to_counterparty).transpose()
    }

    async fn find_by_tax_id(&self, tax_id: &str) -> Result<Vec<NormalizedCounterparty>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM normalized_counterparties WHERE tax_id = ?")
            .bind(tax_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to query counterparties by tax id: {e}")))?;
        rows.into_iter().map(Self::row_to_counterparty).collect()
    }

    async fn find_by_secondary_tax_id(&self, secondary_tax_id: &str) -> Result<Vec<NormalizedCounterparty>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM normalized_counterparties WHERE secondary_tax_id = ?")
            .bind(secondary_tax_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to query counterparties by secondary tax id: {e}")))?;
        rows.into_iter().map(Self::row_to_counterparty).collect()
    }

    async fn delete(&self, id: CounterpartyId) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM normalized_counterparties WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to delete counterparty: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_paginated(&self, offset: usize, limit: usize) -> Result<Vec<NormalizedCounterparty>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM normalized_counterparties ORDER BY tax_id LIMIT ? OFFSET ?")
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::database_error(format!("failed to list counterparties: {e}")))?;
        rows.into_iter().map(Self::row_to_counterparty).collect()
    }
}
