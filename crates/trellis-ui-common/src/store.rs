//! Store bootstrap.
//!
//! A [`StoreContext`] owns the one [`GraphStore`] every pane queries. The
//! first [`StoreContext::init_store`] call starts loading the configured
//! datasets, strictly one after another in list order; every caller, early or
//! late, awaits the same shared initialization and receives the same store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use trellis_core::{Binding, EngineFactory, FetchOptions, GraphEngine, TextFetcher};
use uuid::Uuid;

use crate::config::{ConfigOverlay, Dataset};
use crate::error::{Error, Result};

/// Number of characters of a rejected dataset shown in parse errors.
pub const PREVIEW_CHARS: usize = 200;

const MARKUP_TAGS: &[&str] = &["<html", "<head", "<body"];

type InitFuture = Shared<BoxFuture<'static, std::result::Result<Arc<GraphStore>, Arc<Error>>>>;

/// The bootstrapped graph store.
///
/// Only reachable through a completed [`StoreContext::init_store`].
pub struct GraphStore {
    id: Uuid,
    engine: Arc<dyn GraphEngine>,
    datasets: Vec<Dataset>,
    loaded_at: DateTime<Utc>,
}

impl GraphStore {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Datasets loaded into this store, in load order.
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn engine(&self) -> &Arc<dyn GraphEngine> {
        &self.engine
    }

    pub async fn query(&self, text: &str) -> Result<Vec<Binding>> {
        self.engine.query(text).await.map_err(Error::Engine)
    }

    pub async fn update(&self, text: &str) -> Result<()> {
        self.engine.update(text).await.map_err(Error::Engine)
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("id", &self.id)
            .field("datasets", &self.datasets)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

struct Inner {
    factory: Arc<dyn EngineFactory>,
    fetcher: Arc<dyn TextFetcher>,
    mime_type: String,
    datasets: Arc<RwLock<Vec<Dataset>>>,
    init: Mutex<Option<InitFuture>>,
    store: RwLock<Option<Arc<GraphStore>>>,
    /// Bumped by `reset` so an initialization started earlier cannot publish.
    epoch: AtomicU64,
}

/// Owner of the shared store and its memoized initialization.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct StoreContext {
    inner: Arc<Inner>,
}

impl StoreContext {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        fetcher: Arc<dyn TextFetcher>,
        mime_type: impl Into<String>,
        datasets: Arc<RwLock<Vec<Dataset>>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                factory,
                fetcher,
                mime_type: mime_type.into(),
                datasets,
                init: Mutex::new(None),
                store: RwLock::new(None),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Context loading the datasets of `config`.
    pub fn from_config(
        config: &ConfigOverlay,
        factory: Arc<dyn EngineFactory>,
        fetcher: Arc<dyn TextFetcher>,
    ) -> Self {
        Self::new(factory, fetcher, config.mime_type(), config.shared_datasets())
    }

    /// Bootstrap the store, or join the bootstrap already in progress.
    ///
    /// A failed bootstrap stays memoized: later calls get the same
    /// [`Error::Bootstrap`] until [`reset`](Self::reset).
    pub async fn init_store(&self) -> Result<Arc<GraphStore>> {
        let init = {
            let mut slot = self.inner.init.lock();
            match slot.as_ref() {
                Some(init) => init.clone(),
                None => {
                    let init = self.start_init();
                    *slot = Some(init.clone());
                    init
                }
            }
        };
        init.await.map_err(Error::Bootstrap)
    }

    fn start_init(&self) -> InitFuture {
        let inner = Arc::clone(&self.inner);
        let epoch = inner.epoch.load(Ordering::Acquire);

        async move {
            let started = Instant::now();
            match bootstrap(&inner).await {
                Ok(store) => {
                    let store = Arc::new(store);
                    {
                        // Held by `reset` while it bumps the epoch
                        let _init = inner.init.lock();
                        if inner.epoch.load(Ordering::Acquire) == epoch {
                            *inner.store.write() = Some(Arc::clone(&store));
                        } else {
                            tracing::debug!(store = %store.id, "store context was reset; not publishing");
                        }
                    }
                    tracing::info!(
                        store = %store.id,
                        datasets = store.datasets.len(),
                        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                        "graph store ready"
                    );
                    Ok(store)
                }
                Err(e) => {
                    tracing::error!(error = %e, "graph store bootstrap failed");
                    Err(Arc::new(e))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// The bootstrapped store. Never starts a bootstrap.
    pub fn get_store(&self) -> Result<Arc<GraphStore>> {
        self.inner.store.read().clone().ok_or(Error::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.store.read().is_some()
    }

    /// Forget the store and any memoized bootstrap. Development use only.
    pub fn reset(&self) {
        let mut init = self.inner.init.lock();
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        *init = None;
        *self.inner.store.write() = None;
        tracing::info!("store context reset");
    }

    /// Datasets the next bootstrap will load.
    pub fn datasets(&self) -> Vec<Dataset> {
        self.inner.datasets.read().clone()
    }

    pub fn mime_type(&self) -> &str {
        &self.inner.mime_type
    }

    pub fn fetcher(&self) -> Arc<dyn TextFetcher> {
        Arc::clone(&self.inner.fetcher)
    }
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("mime_type", &self.inner.mime_type)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

async fn bootstrap(inner: &Inner) -> Result<GraphStore> {
    let datasets = inner.datasets.read().clone();
    let engine = inner.factory.create().await.map_err(Error::Engine)?;
    let options = FetchOptions::default();

    for dataset in &datasets {
        let started = Instant::now();
        let content = inner
            .fetcher
            .fetch_text(&dataset.path, &options)
            .await
            .map_err(|source| Error::Fetch {
                path: dataset.path.clone(),
                source,
            })?;

        if looks_like_markup(&content, &inner.mime_type) {
            return Err(Error::MarkupInsteadOfData {
                path: dataset.path.clone(),
            });
        }

        engine
            .load(&content, &inner.mime_type, dataset.base_iri())
            .await
            .map_err(|source| Error::DatasetParse {
                path: dataset.path.clone(),
                preview: preview(&content),
                source,
            })?;

        tracing::info!(
            path = %dataset.path,
            base = %dataset.base,
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "dataset loaded"
        );
    }

    Ok(GraphStore {
        id: Uuid::new_v4(),
        engine,
        datasets,
        loaded_at: Utc::now(),
    })
}

/// Whether a fetched document is an HTML/XML page rather than graph data.
///
/// Only the first non-blank line is inspected. The XML declaration counts as
/// markup unless the dataset format is itself XML based.
pub fn looks_like_markup(content: &str, mime_type: &str) -> bool {
    let Some(first) = content.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return false;
    };
    let first = first.to_ascii_lowercase();

    if first.starts_with("<!doctype") {
        return true;
    }
    let opens_tag = MARKUP_TAGS.iter().any(|tag| {
        first
            .strip_prefix(tag)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
    });
    if opens_tag {
        return true;
    }
    first.starts_with("<?xml") && !mime_type.to_ascii_lowercase().contains("xml")
}

/// Leading characters of a document, for error messages.
pub fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}
