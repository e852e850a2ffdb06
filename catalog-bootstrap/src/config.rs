// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Config Path Resolution
//!
//! Resolves the config file path the engine should load, before
//! `catalog-engine::infrastructure::config::AppConfig` does any parsing.
//! Kept here (rather than duplicating `AppConfig`) because this crate
//! cannot depend on `catalog-engine` — see the crate-level doc comment.

use std::path::{Path, PathBuf};

/// Search order used when `--config` is not given: `./catalog.toml`, then
/// `CATALOG_CONFIG_DIR`/catalog.toml, then the engine's compiled-in default.
const CANDIDATE_NAMES: &[&str] = &["catalog.toml", "config/catalog.toml"];

pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(dir) = std::env::var("CATALOG_CONFIG_DIR") {
        let candidate = Path::new(&dir).join("catalog.toml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    CANDIDATE_NAMES.iter().map(PathBuf::from).find(|candidate| candidate.exists())
}
