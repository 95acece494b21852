//! Main UI service entry point.
//!
//! The [`UiService`] wires the orchestration pieces together: it applies the
//! persisted configuration overlay, owns the [`StoreContext`] and the
//! [`EventBus`], and hands panes their [`PaneContext`].

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use trellis_core::{EngineFactory, FsFetcher, KvStorage, MemoryStorage, TextFetcher};

use crate::bus::EventBus;
use crate::compat::{CompatBridge, LegacyEvent};
use crate::config::{ConfigOverlay, ConfigSnapshot, Theme};
use crate::error::{Error, Result};
use crate::pane::PaneContext;
use crate::query::QueryService;
use crate::store::{GraphStore, StoreContext};

/// Main service coordinating the store, the bus and configuration.
///
/// # Example
///
/// ```ignore
/// let service = UiService::builder()
///     .engine_factory(OxigraphEngine::factory())
///     .fetcher(Arc::new(FsFetcher::new("site")))
///     .build()?;
///
/// let result = service
///     .queries()
///     .await?
///     .run_path("queries/nodes.rq", &FetchOptions::default())
///     .await?;
/// ```
pub struct UiService {
    ctx: PaneContext,
    storage: Arc<dyn KvStorage>,
    compat: Option<CompatBridge>,
}

impl UiService {
    pub fn builder() -> UiServiceBuilder {
        UiServiceBuilder::default()
    }

    pub fn bus(&self) -> &EventBus {
        &self.ctx.bus
    }

    pub fn store(&self) -> &StoreContext {
        &self.ctx.store
    }

    pub fn fetcher(&self) -> &Arc<dyn TextFetcher> {
        &self.ctx.fetcher
    }

    pub fn storage(&self) -> &Arc<dyn KvStorage> {
        &self.storage
    }

    /// Get the configuration overlay.
    pub fn config(&self) -> &Arc<RwLock<ConfigOverlay>> {
        &self.ctx.config
    }

    pub fn config_snapshot(&self) -> ConfigSnapshot {
        self.ctx.config.read().snapshot()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Convenience methods that delegate to components
    // ─────────────────────────────────────────────────────────────────────

    /// Bootstrap the store. Announces [`StoreReady`] after the first success.
    pub async fn init_store(&self) -> Result<Arc<GraphStore>> {
        self.ctx.init_store().await
    }

    /// Query service over the store, bootstrapping it if needed.
    pub async fn queries(&self) -> Result<QueryService> {
        self.ctx.query_service().await
    }

    /// Query service over an already bootstrapped store.
    pub fn query_service(&self) -> Result<QueryService> {
        QueryService::from_context(&self.ctx.store, Arc::clone(&self.ctx.fetcher))
    }

    /// Drop the store so the next bootstrap starts over.
    pub fn reset_store(&self) {
        self.ctx.reset_store();
    }

    pub fn pane_context(&self) -> PaneContext {
        self.ctx.clone()
    }

    /// Rebroadcast events, when built with [`UiServiceBuilder::compat`].
    pub fn legacy_events(&self) -> Option<broadcast::Receiver<LegacyEvent>> {
        self.compat.as_ref().map(CompatBridge::subscribe)
    }

    /// Stop rebroadcasting. No-op without compatibility mode.
    pub fn disable_compat(&mut self) {
        if let Some(bridge) = self.compat.take() {
            bridge.detach();
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::load(self.storage.as_ref())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        theme.save(self.storage.as_ref())
    }
}

impl std::fmt::Debug for UiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiService")
            .field("store", &self.ctx.store)
            .field("bus", &self.ctx.bus)
            .field("compat", &self.compat.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`UiService`].
#[derive(Default)]
pub struct UiServiceBuilder {
    factory: Option<Arc<dyn EngineFactory>>,
    fetcher: Option<Arc<dyn TextFetcher>>,
    storage: Option<Arc<dyn KvStorage>>,
    config: Option<ConfigOverlay>,
    bus: Option<EventBus>,
    compat_capacity: Option<usize>,
}

impl UiServiceBuilder {
    /// Engine used for the store. Required.
    pub fn engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Fetcher for datasets and query documents. Defaults to the filesystem
    /// relative to the working directory.
    pub fn fetcher(mut self, fetcher: Arc<dyn TextFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Storage for persisted overrides and preferences. Defaults to memory.
    pub fn storage(mut self, storage: Arc<dyn KvStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Starting configuration. Persisted overrides are still applied on top.
    pub fn config(mut self, config: ConfigOverlay) -> Self {
        self.config = Some(config);
        self
    }

    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Rebroadcast the standard events as [`LegacyEvent`]s on a channel of
    /// `capacity` slots.
    pub fn compat(mut self, capacity: usize) -> Self {
        self.compat_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<UiService> {
        let factory = self
            .factory
            .ok_or_else(|| Error::Config("an engine factory is required".into()))?;
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(FsFetcher::new(".")));
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let mut config = self.config.unwrap_or_default();
        let outcome = config.apply_persisted(storage.as_ref());
        tracing::debug!(?outcome, datasets = config.datasets().len(), "configuration ready");

        let store = StoreContext::from_config(&config, factory, Arc::clone(&fetcher));

        let bus = self.bus.unwrap_or_default();
        let compat = match self.compat_capacity {
            Some(0) => {
                return Err(Error::Config(
                    "compat channel capacity must be positive".into(),
                ))
            }
            Some(capacity) => Some(CompatBridge::new(&bus, capacity).forward_standard()),
            None => None,
        };

        let ctx = PaneContext::new(bus, store, fetcher, Arc::new(RwLock::new(config)));
        Ok(UiService {
            ctx,
            storage,
            compat,
        })
    }
}
