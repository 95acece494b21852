//! Subcommand handlers.
//!
//! Each handler writes its output to the given writer; logging goes to
//! stderr through `tracing`.

pub mod config;
pub mod datasets;
pub mod panes;
pub mod query;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::sync::broadcast::error::RecvError;
use trellis_core::{EngineFactory, FsFetcher, JsonFileStorage, KvStorage, MemoryStorage};
use trellis_ui_common::UiService;

use crate::app_config::AppConfig;
use crate::cli::Commands;

/// Slots in the legacy rebroadcast channel.
const LEGACY_CAPACITY: usize = 64;

/// What every handler gets: resolved app config, storage, output mode.
pub struct CommandContext {
    pub app: AppConfig,
    pub storage: Arc<dyn KvStorage>,
    pub json: bool,
    /// Log events rebroadcast to legacy listeners.
    pub legacy_events: bool,
}

impl CommandContext {
    pub fn new(app: AppConfig, json: bool) -> anyhow::Result<Self> {
        let storage = open_storage(&app)?;
        Ok(Self {
            app,
            storage,
            json,
            legacy_events: false,
        })
    }

    pub fn with_legacy_events(mut self, enabled: bool) -> Self {
        self.legacy_events = enabled;
        self
    }

    /// Service over the configured data root, with persisted overrides applied.
    pub fn service(&self) -> anyhow::Result<UiService> {
        let root = self.app.data_root();
        tracing::debug!(root = %root.display(), "building service");
        let mut builder = UiService::builder()
            .engine_factory(engine_factory()?)
            .fetcher(Arc::new(FsFetcher::new(root)))
            .storage(Arc::clone(&self.storage));
        if self.legacy_events {
            builder = builder.compat(LEGACY_CAPACITY);
        }
        let service = builder.build()?;
        if let Some(mut events) = service.legacy_events() {
            tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => tracing::info!(
                            target: "trellis::legacy",
                            event = %event.name,
                            detail = %event.detail,
                            "legacy event"
                        ),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "legacy event log fell behind")
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }
        Ok(service)
    }
}

pub async fn run<W: Write>(command: Commands, ctx: &CommandContext, out: &mut W) -> anyhow::Result<()> {
    match command {
        Commands::Query { path, no_cache } => query::run_path(ctx, &path, no_cache, out).await,
        Commands::Exec { text } => query::run_text(ctx, &text, out).await,
        Commands::Datasets { load } => datasets::handle(ctx, load, out).await,
        Commands::Config { command } => config::handle(ctx, command, out),
        Commands::Panes { views } => panes::handle(ctx, views, out).await,
    }
}

fn open_storage(app: &AppConfig) -> anyhow::Result<Arc<dyn KvStorage>> {
    match app.storage_path() {
        Some(path) => {
            let storage = JsonFileStorage::open(&path)
                .with_context(|| format!("opening storage file {}", path.display()))?;
            Ok(Arc::new(storage))
        }
        None => {
            tracing::warn!("no storage location available; overrides will not persist");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

#[cfg(feature = "oxigraph")]
fn engine_factory() -> anyhow::Result<Arc<dyn EngineFactory>> {
    Ok(Arc::new(trellis_core::OxigraphEngine::factory()))
}

#[cfg(not(feature = "oxigraph"))]
fn engine_factory() -> anyhow::Result<Arc<dyn EngineFactory>> {
    anyhow::bail!("trellis was built without a graph engine; enable the `oxigraph` feature")
}
