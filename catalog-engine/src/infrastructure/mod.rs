//! # Infrastructure
//!
//! Ports-and-adapters outer layer: configuration, logging, metrics, the
//! similarity cache, retry policy, and the SQLite repository adapters.
//! Nothing in `application` depends on concrete infrastructure types
//! directly — only on the `catalog_domain::repositories` traits these
//! adapters implement.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod repositories;
pub mod retry;
pub mod similarity_cache;
