//! Log setup: console always, plus an append-only log file when configured.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// Install the global subscriber.
///
/// `RUST_LOG` takes priority over the configured level; `verbose` forces
/// debug output for this crate on top of either.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());
    let mut filter = EnvFilter::try_new(&level)
        .with_context(|| format!("invalid log filter '{}'", level))?;
    if verbose {
        filter = filter.add_directive("shelf=debug".parse()?);
    }

    let console = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(true);

    let file = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("installing log subscriber")?;
    Ok(())
}
