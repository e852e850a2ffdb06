//! # Presentation
//!
//! The admin CLI's command dispatch, thin by design: every operation it
//! exposes is a one-line call into an already-constructed application
//! service. `main.rs` owns wiring those services together.

pub mod cli;

pub use cli::{dispatch, Services};
