//! # Domain Service Interfaces
//!
//! Trait-only seams between the domain's business rules and
//! `catalog-engine`'s concrete implementations (stage runner, similarity
//! cache, orchestrator, provider adapters).

mod benchmark_finder;
mod ingest_gateway;
mod provider_adapter;
mod registry_provider;
mod similarity_service;
mod stage_service;

pub use benchmark_finder::{BenchmarkFinder, BenchmarkMatch};
pub use ingest_gateway::{IngestGateway, IngestItemRecord};
pub use provider_adapter::{ClassifyRequest, ClassifyResponse, ProviderAdapter};
pub use registry_provider::{RegistryProviderAdapter, RegistryRecord};
pub use similarity_service::{FingerprintService, SimilarityCandidate, SimilarityService};
pub use stage_service::{StageBatch, StageOutcome, StageService};
