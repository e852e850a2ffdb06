//! # Aggregates
//!
//! Event-sourced consistency boundaries. Currently a single aggregate,
//! `PipelineRunAggregate`, tracking one pipeline run per upload.

mod pipeline_run;

pub use pipeline_run::{PipelineRunAggregate, RunState, StageCounters};
