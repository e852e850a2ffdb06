// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Type
//!
//! `CatalogError` is the single error type returned by every domain trait
//! and propagated up through the application and infrastructure layers.
//! Infrastructure-specific error sources (`sqlx::Error`, `std::io::Error`)
//! are converted into it at the layer that owns the dependency rather than
//! here, keeping this crate free of infrastructure concerns.

use thiserror::Error;

/// Errors produced by domain operations across the catalog pipeline,
/// AI orchestrator, classifier, enrichment, snapshot, and quality-assessor
/// subsystems.
#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    /// Input failed a validation rule (malformed id, out-of-range value,
    /// config that doesn't parse).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A pipeline run was requested against a database that already has
    /// one in progress.
    #[error("pipeline already running: {0}")]
    AlreadyRunning(String),

    /// The resource is momentarily unavailable (no free channel slots, a
    /// lock is held) — safe to retry shortly.
    #[error("busy: {0}")]
    Busy(String),

    /// An operation exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A failure that is expected to clear on retry (transport error,
    /// transient store unavailability).
    #[error("transient error: {0}")]
    Transient(String),

    /// Every registered AI provider failed or was circuit-open for a
    /// request.
    #[error("all providers failed: {0}")]
    AllProvidersFailed(String),

    /// A provider's circuit breaker is open and rejecting requests.
    #[error("circuit open: provider {0}")]
    CircuitOpen(String),

    /// No free channel/semaphore capacity was available within budget.
    #[error("no capacity: {0}")]
    NoCapacity(String),

    /// A failure that will not clear on retry without intervention.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// I/O failure (reading an export file, writing an artifact).
    #[error("I/O error: {0}")]
    Io(String),

    /// Persistence-layer failure.
    #[error("database error: {0}")]
    Database(String),

    /// (De)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Unexpected internal invariant violation — a bug, not user error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_running(msg: impl Into<String>) -> Self {
        Self::AlreadyRunning(msg.into())
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn all_providers_failed(msg: impl Into<String>) -> Self {
        Self::AllProvidersFailed(msg.into())
    }

    pub fn circuit_open(provider: impl Into<String>) -> Self {
        Self::CircuitOpen(provider.into())
    }

    pub fn no_capacity(msg: impl Into<String>) -> Self {
        Self::NoCapacity(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short machine-stable category name, used for metrics labels and
    /// structured log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::AlreadyRunning(_) => "already_running",
            Self::Busy(_) => "busy",
            Self::Timeout(_) => "timeout",
            Self::Transient(_) => "transient",
            Self::AllProvidersFailed(_) => "all_providers_failed",
            Self::CircuitOpen(_) => "circuit_open",
            Self::NoCapacity(_) => "no_capacity",
            Self::Fatal(_) => "fatal",
            Self::Io(_) => "io",
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether a caller may reasonably retry the operation that produced
    /// this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Busy(_) | Self::Timeout(_) | Self::Transient(_) | Self::NoCapacity(_)
        )
    }

    /// Whether the error should count as an AI-provider circuit failure.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Transient(_) | Self::CircuitOpen(_) | Self::Fatal(_)
        )
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
