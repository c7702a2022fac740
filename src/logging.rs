//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level so individual
//! targets can be tuned without touching the config file.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Build the filter from `RUST_LOG`, falling back to the configured level
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| anyhow!("Invalid RUST_LOG directives: {e}")),
        _ => EnvFilter::try_new(format!(
            "{level},tower_http={level},hyper=warn,reqwest=warn",
            level = config.level
        ))
        .map_err(|e| anyhow!("Invalid log level '{}': {e}", config.level)),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.format == "json" {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
