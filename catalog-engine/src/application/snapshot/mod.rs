//! # Snapshot Engine
//!
//! Freezes ordered sequences of completed uploads into comparable
//! iterations (spec.md §4.6): create, auto-create, compare, evolution
//! trails, and per-iteration metrics.

mod snapshot_engine;

pub use snapshot_engine::{EvolutionPoint, IterationDiff, IterationMetrics, SnapshotEngine};
