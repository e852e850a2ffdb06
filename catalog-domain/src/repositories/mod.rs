//! # Repository Interfaces
//!
//! Storage-technology-independent persistence contracts. Concrete
//! implementations (sqlx/SQLite adapters) live in
//! `catalog-engine::infrastructure::repositories`.

mod catalog_item_repository;
mod classifier_repository;
mod counterparty_repository;
mod normalized_item_repository;
mod provider_repository;
mod quality_repository;
mod snapshot_repository;
mod upload_repository;

pub use catalog_item_repository::CatalogItemRepository;
pub use classifier_repository::ClassifierRepository;
pub use counterparty_repository::CounterpartyRepository;
pub use normalized_item_repository::NormalizedItemRepository;
pub use provider_repository::ProviderRepository;
pub use quality_repository::QualityRepository;
pub use snapshot_repository::SnapshotRepository;
pub use upload_repository::UploadRepository;
