use std::process::ExitCode;

use anyhow::{anyhow, Result};
use claimflow_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) -> Result<()> {
    use claimflow_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    // stdout carries the JSON command result, so logs go to stderr.
    let installed = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> Result<ExitCode> {
    // Commands report config problems themselves; logging falls back to defaults.
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&config)?;

    Ok(claimflow_cli::run())
}
