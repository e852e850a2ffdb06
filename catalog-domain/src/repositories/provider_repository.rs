//! # Provider Repository Interface

use async_trait::async_trait;

use crate::entities::Provider;
use crate::error::CatalogError;
use crate::value_objects::ProviderId;

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Idempotent by `provider_key`: re-registering updates fields on the
    /// existing row rather than inserting a duplicate (spec.md §4.3).
    async fn upsert(&self, provider: &Provider) -> Result<(), CatalogError>;

    async fn find_by_id(&self, id: ProviderId) -> Result<Option<Provider>, CatalogError>;
    async fn find_by_key(&self, provider_key: &str) -> Result<Option<Provider>, CatalogError>;
    async fn list_enabled(&self) -> Result<Vec<Provider>, CatalogError>;
    async fn list_all(&self) -> Result<Vec<Provider>, CatalogError>;
}
