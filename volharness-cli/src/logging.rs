//! Tracing setup for the volharness binary.
//!
//! The `[log]` config section picks the level and the output format;
//! `RUST_LOG` overrides the level when set.

use anyhow::{Context, Result, bail};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use volharness_core::config::LogConfig;

/// Install the global subscriber. Call once, before any logging happens.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let base = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "json" => base.with(fmt::layer().json()).try_init(),
        "pretty" => base.with(fmt::layer().pretty()).try_init(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    }
    .context("tracing subscriber already installed")
}
