//! # Counterparty Repository Interface

use async_trait::async_trait;

use crate::entities::NormalizedCounterparty;
use crate::error::CatalogError;
use crate::value_objects::CounterpartyId;

#[async_trait]
pub trait CounterpartyRepository: Send + Sync {
    async fn save(&self, counterparty: &NormalizedCounterparty) -> Result<(), CatalogError>;
    async fn find_by_id(&self, id: CounterpartyId) -> Result<Option<NormalizedCounterparty>, CatalogError>;

    /// At most one row per (project, tax_id) after merge — spec.md §3
    /// invariant; `project` scoping is the caller's responsibility via
    /// the concrete adapter's connection/table choice.
    async fn find_by_tax_id(&self, tax_id: &str) -> Result<Vec<NormalizedCounterparty>, CatalogError>;

    async fn find_by_secondary_tax_id(
        &self,
        secondary_tax_id: &str,
    ) -> Result<Vec<NormalizedCounterparty>, CatalogError>;

    async fn delete(&self, id: CounterpartyId) -> Result<bool, CatalogError>;

    async fn list_paginated(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<NormalizedCounterparty>, CatalogError>;
}
