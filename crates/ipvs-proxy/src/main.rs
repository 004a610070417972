//! ipvs-proxy binary

use anyhow::Context;
use clap::Parser;
use ipvs::Handler;
use ipvs_proxy::{Cli, Config, LogFormat, render_plan};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging settings)
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    match cli.log_format.or(config.logging.format).unwrap_or_default() {
        LogFormat::Text => common::logging::init(&level),
        LogFormat::Json => common::logging::init_json(&level),
    }

    tracing::info!(
        service = %config.service(),
        backends = config.backends.len(),
        "Configuration loaded"
    );

    if cli.dry_run {
        print!("{}", render_plan(&config, cli.output)?);
        return Ok(());
    }

    let handler = Handler::new().context("failed to create IPVS handler")?;
    handler
        .apply(&config.service(), &config.destinations())
        .context("failed to apply IPVS configuration")?;

    if !cli.no_status {
        if let Err(e) = handler.show_status() {
            tracing::warn!(error = %e, "Could not list IPVS table");
        }
    }

    handler.close();
    Ok(())
}
