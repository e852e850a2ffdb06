//! # Registry Provider Adapter
//!
//! The capability the counterparty enrichment service sees for every
//! external registry backend (spec.md §4.5), mirroring `ProviderAdapter`'s
//! one-directional, transport-agnostic shape: the enrichment service never
//! knows about HTTP, auth, or per-registry response formats.

use async_trait::async_trait;

use crate::error::CatalogError;

/// One registry's view of a counterparty, tagged with how confident that
/// registry is in the result (used by the merge policy to pick the best
/// source for each field).
#[derive(Debug, Clone, Default)]
pub struct RegistryRecord {
    pub secondary_tax_id: Option<String>,
    pub legal_form: Option<String>,
    pub legal_address: Option<String>,
    pub postal_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub subcategory: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bic: Option<String>,
    pub confidence: f32,
}

#[async_trait]
pub trait RegistryProviderAdapter: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Looks up a counterparty by tax id. `Ok(None)` means the registry
    /// has no record, not an error.
    async fn lookup(&self, tax_id: &str) -> Result<Option<RegistryRecord>, CatalogError>;
}
