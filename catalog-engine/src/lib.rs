// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # catalog-engine
//!
//! Application and infrastructure layers for the catalog normalization and
//! classification pipeline: the 13-stage pipeline engine, the AI
//! orchestrator and hierarchical classifier, counterparty enrichment, the
//! snapshot engine, the quality assessor, and the concrete SQLite/config/
//! logging/metrics adapters for `catalog-domain`'s repository and service
//! traits.
//!
//! ## Layering
//!
//! - [`application`] — use cases, depends only on `catalog_domain`'s
//!   traits.
//! - [`infrastructure`] — config, logging, metrics, retry, the similarity
//!   cache, and the SQLite repository adapters.
//! - [`presentation`] — the admin CLI.
//!
//! Tests are organized as `#[cfg(test)]` modules alongside the code they
//! cover, plus integration tests under `tests/`.

pub mod application;
pub mod infrastructure;
pub mod presentation;
