// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Catalog Bootstrap
//!
//! The process-entry layer: secure CLI parsing, config path resolution,
//! exit code mapping, signal handling, and graceful shutdown. Depends on
//! nothing but `catalog-domain`'s error type and third-party crates —
//! `catalog-engine` depends on this crate, never the reverse.
//!
//! ```text
//! catalog-bootstrap (this crate)
//!   ├── cli         secure arg parsing + validation
//!   ├── config      config path resolution
//!   ├── exit_code   CatalogError -> process exit code
//!   ├── logger      pre-tracing-init bootstrap logging
//!   ├── platform    host/process facts
//!   ├── shutdown    cancellation token + grace-period coordinator
//!   └── signals     OS signal -> CancellationToken wiring
//! ```
//!
//! `catalog-engine`'s `main.rs` calls [`cli::parse_and_validate`] first,
//! then [`config::resolve_config_path`], then installs [`signals::install`]
//! against a [`shutdown::ShutdownCoordinator`], and finally maps its
//! top-level `Result` through [`exit_code::result_to_exit_code`].

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, Command, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};
pub use logger::{BootstrapLogger, ConsoleLogger};
pub use platform::{HostPlatform, Platform, PlatformError};
pub use shutdown::{CancellationToken, ShutdownCoordinator};
