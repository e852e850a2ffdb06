//! # Counterparty Enrichment
//!
//! Provider-router fan-out, field-level merge, and duplicate detection
//! over `NormalizedCounterparty` (spec.md §4.5).

mod enrichment_service;

pub use enrichment_service::{EnrichResult, EnrichmentService};
