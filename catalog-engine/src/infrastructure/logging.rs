//! # Logging
//!
//! Initializes the process-wide `tracing` subscriber from
//! `LoggingConfig`, grounded on the teacher's bootstrap `logger` module:
//! an env-filter driven subscriber, switchable between pretty and JSON
//! formatting.

use tracing_subscriber::{fmt, EnvFilter};

use super::config::LoggingConfig;

pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}
