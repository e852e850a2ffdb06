//! # Quality Assessor
//!
//! Duplicate-group discovery, rule-based violation detection, and
//! benchmark-backed suggestions over finished rows (spec.md §4.7).

mod quality_assessor;

pub use quality_assessor::{AnalyzeCounts, QualityAssessor, QualityProgress};
