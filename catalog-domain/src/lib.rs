// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # catalog-domain
//!
//! The domain layer of the catalog normalization and classification
//! system: entities, value objects, aggregates, domain events, and the
//! trait-only interfaces (repositories, stage service, similarity,
//! benchmark finder, provider adapter) that `catalog-engine` implements.
//!
//! ## Architecture
//!
//! This crate has no knowledge of SQLite, HTTP, or any concrete AI
//! backend. It depends only on `serde`, `uuid`, `chrono`, `thiserror`,
//! `async-trait`, and a thin slice of `tokio::sync` for the cooperative
//! cancellation token shared across layers. Everything infrastructure
//! (persistence, config, logging, metrics) lives in `catalog-engine`.
//!
//! ## Modules
//!
//! - [`error`] — `CatalogError`, the single error type domain operations
//!   return.
//! - [`value_objects`] — identifiers, confidence/similarity scores,
//!   fingerprints, processing level.
//! - [`entities`] — `Upload`, `CatalogItem`, `NormalizedItem`,
//!   `ClassifierNode`, `NormalizedCounterparty`, `Snapshot`, `Provider`,
//!   and the quality-assessor artifacts.
//! - [`events`] / [`aggregates`] — the event-sourced pipeline-run
//!   aggregate.
//! - [`services`] — domain trait seams (`StageService`,
//!   `SimilarityService`, `BenchmarkFinder`, `ProviderAdapter`).
//! - [`repositories`] — persistence contracts.
//! - [`cancellation`] — the cooperative `CancellationToken`.

pub mod aggregates;
pub mod cancellation;
pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use cancellation::CancellationToken;
pub use error::CatalogError;
