//! # Application
//!
//! Use-case layer: the pipeline engine and its stages, the AI
//! orchestrator and hierarchical classifier, counterparty enrichment, the
//! snapshot engine, and the quality assessor. Depends only on
//! `catalog_domain`'s repository and service traits — never on a concrete
//! `infrastructure` type.

pub mod classifier;
pub mod enrichment;
mod ingest;
pub mod orchestrator;
mod pipeline_engine;
pub mod quality;
pub mod similarity;
pub mod snapshot;
pub mod stages;

pub use ingest::InProcessIngestGateway;
pub use pipeline_engine::{PipelineEngine, PipelineOptions, PipelineStatus};
