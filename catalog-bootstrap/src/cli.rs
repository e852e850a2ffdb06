// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parsing and Validation
//!
//! Two-step parse: `clap` derives the raw [`Cli`]/[`Command`] shape, then
//! [`validate_cli`] re-checks anything `clap` can't express on its own —
//! path existence, numeric ranges — before application code ever sees it.
//! `parse_and_validate` is the one entry point `catalog-engine`'s
//! `main.rs` calls.
//!
//! The teacher splits this into `cli/parser.rs` and `cli/validator.rs`
//! submodules; kept flat here since the two halves are small enough not
//! to earn their own files.

use std::path::PathBuf;

use catalog_domain::error::CatalogError;
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser, Debug, Clone)]
#[command(name = "catalog-admin", version, about = "Catalog normalization & classification pipeline")]
pub struct Cli {
    /// Path to the TOML configuration file. Defaults to the engine's
    /// built-in search path when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `logging.level` from the config file.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Replay a previously captured ingest session through the
    /// handshake/item/complete contract.
    IngestReplay {
        /// Path to a file of newline-delimited ingest item JSON records.
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "default")]
        config_name: String,
    },
    /// Start the normalization/classification pipeline against pending items.
    PipelineStart {
        #[arg(long)]
        upload: Option<Uuid>,
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },
    /// Requests a graceful pipeline stop.
    PipelineStop,
    /// Reports current pipeline run status.
    PipelineStatus,
    /// Creates a point-in-time snapshot of the catalog.
    SnapshotCreate {
        #[arg(long)]
        label: Option<String>,
    },
    /// Compares two snapshots and reports the delta.
    SnapshotCompare { left: Uuid, right: Uuid },
    /// Shows the per-item evolution trail recorded by a snapshot.
    SnapshotEvolution { snapshot: Uuid },
    /// Reports aggregate metrics for a snapshot.
    SnapshotMetrics { snapshot: Uuid },
    /// Runs the quality assessor over normalized items.
    QualityRun {
        #[arg(long)]
        upload: Option<Uuid>,
        #[arg(long, default_value_t = 0.7)]
        similarity_threshold: f32,
    },
    /// Marks a quality violation as resolved.
    QualityResolve { violation: Uuid },
    /// Applies a quality suggestion to its target item.
    QualityApply { suggestion: Uuid },
    /// Runs counterparty enrichment against configured registries.
    EnrichmentRun {
        #[arg(long)]
        upload: Option<Uuid>,
    },
    /// Merges a group of duplicate counterparties into one record.
    EnrichmentMerge { primary: Uuid, duplicates: Vec<Uuid> },
}

/// A [`Cli`] that has passed [`validate_cli`]. Application code only ever
/// receives this type, never the raw `clap` output.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub command: ValidatedCommand,
}

pub type ValidatedCommand = Command;

pub fn parse_cli() -> Cli {
    Cli::parse()
}

pub fn validate_cli(cli: Cli) -> Result<ValidatedCli, CatalogError> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(CatalogError::validation(format!("config path does not exist: {}", path.display())));
        }
    }

    if let Some(level) = &cli.log_level {
        const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !VALID_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(CatalogError::validation(format!("invalid log level: {level}")));
        }
    }

    validate_command(&cli.command)?;

    Ok(ValidatedCli { config: cli.config, log_level: cli.log_level, command: cli.command })
}

fn validate_command(command: &Command) -> Result<(), CatalogError> {
    match command {
        Command::IngestReplay { file, .. } => {
            if !file.exists() {
                return Err(CatalogError::validation(format!("ingest replay file does not exist: {}", file.display())));
            }
            Ok(())
        }
        Command::PipelineStart { batch_size, .. } => {
            if *batch_size == 0 || *batch_size > 10_000 {
                return Err(CatalogError::validation(format!("batch_size must be in 1..=10000, got {batch_size}")));
            }
            Ok(())
        }
        Command::QualityRun { similarity_threshold, .. } => {
            if !(0.0..=1.0).contains(similarity_threshold) {
                return Err(CatalogError::validation(format!(
                    "similarity_threshold must be in 0.0..=1.0, got {similarity_threshold}"
                )));
            }
            Ok(())
        }
        Command::EnrichmentMerge { duplicates, .. } => {
            if duplicates.is_empty() {
                return Err(CatalogError::validation("enrichment merge requires at least one duplicate"));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `parse_cli()` followed by `validate_cli(...)` — the sole entry point
/// `main` should call.
pub fn parse_and_validate() -> Result<ValidatedCli, CatalogError> {
    validate_cli(parse_cli())
}
