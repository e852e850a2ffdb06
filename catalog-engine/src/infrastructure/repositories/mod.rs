//! # Repository Adapters
//!
//! SQLite implementations of the repository interfaces in
//! `catalog_domain::repositories`, plus schema bootstrap for the two
//! stores.

pub mod schema;

mod sqlite_benchmark_finder;
mod sqlite_catalog_item_repository;
mod sqlite_classifier_repository;
mod sqlite_counterparty_repository;
mod sqlite_normalized_item_repository;
mod sqlite_provider_repository;
mod sqlite_quality_repository;
mod sqlite_snapshot_repository;
mod sqlite_upload_repository;

pub use sqlite_benchmark_finder::SqliteBenchmarkFinder;
pub use sqlite_catalog_item_repository::SqliteCatalogItemRepository;
pub use sqlite_classifier_repository::SqliteClassifierRepository;
pub use sqlite_counterparty_repository::SqliteCounterpartyRepository;
pub use sqlite_normalized_item_repository::SqliteNormalizedItemRepository;
pub use sqlite_provider_repository::SqliteProviderRepository;
pub use sqlite_quality_repository::SqliteQualityRepository;
pub use sqlite_snapshot_repository::SqliteSnapshotRepository;
pub use sqlite_upload_repository::SqliteUploadRepository;
