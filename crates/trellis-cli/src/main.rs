use std::io;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use trellis_cli::app_config::{AppConfig, ConfigManager};
use trellis_cli::cli::Cli;
use trellis_cli::commands::{self, CommandContext};
use trellis_cli::logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut app = load_app_config(&cli)?;
    if let Some(root) = &cli.data_root {
        app.data.root = root.display().to_string();
    }
    if let Some(level) = &cli.log_level {
        app.logging.level = level.clone();
    }
    init_logging(
        &app.logging.level,
        app.logging.log_dir.as_deref().map(std::path::Path::new),
    )?;
    tracing::debug!(?app, "application config loaded");

    let ctx = CommandContext::new(app, cli.json)?.with_legacy_events(cli.legacy_events);
    let mut stdout = io::stdout().lock();
    let command = commands::run(cli.command, &ctx, &mut stdout);
    match cli.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), command)
            .await
            .with_context(|| format!("timed out after {secs}s"))?,
        None => command.await,
    }
}

fn load_app_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigManager::load().context("loading application config")?,
    };
    Ok(manager.into_config())
}
