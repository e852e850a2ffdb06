//! # Hierarchical Classifier
//!
//! Top-down taxonomy walk over `ClassifierNode`, driven by the AI
//! orchestrator and short-circuited by the benchmark finder (spec.md
//! §4.4).

mod hierarchical_classifier;

pub use hierarchical_classifier::{ClassifyOutcome, ClassifyStep, HierarchicalClassifier};
