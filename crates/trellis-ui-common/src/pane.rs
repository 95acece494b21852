//! Pane lifecycle contract.
//!
//! A pane is mounted once, suspended and resumed any number of times, and
//! unmounted once. Everything it registers while mounted (bus subscriptions,
//! listener tasks, cleanup callbacks) is collected in a [`MountState`] and
//! released in one call on unmount.
//!
//! Asynchronous renders never cancel each other. Each render takes a
//! [`RenderTicket`] from the pane's [`RenderGuard`] and paints only if no
//! newer render started in the meantime.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trellis_core::TextFetcher;

use crate::bus::{EventBus, Subscription};
use crate::config::ConfigOverlay;
use crate::error::{Error, Result};
use crate::events::StoreReady;
use crate::query::QueryService;
use crate::store::{GraphStore, StoreContext};
use crate::surface::Surface;

/// A UI module driven by a pane host.
pub trait Pane: Send {
    /// Stable view id, matched against [`TabActivated`](crate::events::TabActivated).
    fn id(&self) -> &str;

    /// Paint the initial view and register listeners. At most once.
    fn mount(&mut self, surface: Arc<Surface>, ctx: PaneContext) -> Result<()>;

    /// The pane became visible. Idempotent.
    fn resume(&mut self) -> Result<()>;

    /// The pane was hidden. Idempotent.
    fn suspend(&mut self) -> Result<()>;

    /// Release everything registered by `mount`. No-op when not mounted.
    fn unmount(&mut self);

    fn is_mounted(&self) -> bool;
}

/// Shared services handed to a pane on mount.
#[derive(Clone)]
pub struct PaneContext {
    pub bus: EventBus,
    pub store: StoreContext,
    pub fetcher: Arc<dyn TextFetcher>,
    pub config: Arc<RwLock<ConfigOverlay>>,
    ready_announced: Arc<AtomicBool>,
}

impl PaneContext {
    pub fn new(
        bus: EventBus,
        store: StoreContext,
        fetcher: Arc<dyn TextFetcher>,
        config: Arc<RwLock<ConfigOverlay>>,
    ) -> Self {
        Self {
            bus,
            store,
            fetcher,
            config,
            ready_announced: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bootstrap the shared store. The first success is announced as
    /// [`StoreReady`] on the bus.
    pub async fn init_store(&self) -> Result<Arc<GraphStore>> {
        let store = self.store.init_store().await?;
        if !self.ready_announced.swap(true, Ordering::AcqRel) {
            self.bus.emit(StoreReady {
                datasets: store.datasets().len(),
            });
        }
        Ok(store)
    }

    /// Query service over the shared store, bootstrapping it if needed.
    pub async fn query_service(&self) -> Result<QueryService> {
        let store = self.init_store().await?;
        Ok(QueryService::new(store, Arc::clone(&self.fetcher)))
    }

    /// Drop the store so the next bootstrap starts over and is announced again.
    pub fn reset_store(&self) {
        self.store.reset();
        self.ready_announced.store(false, Ordering::Release);
    }

    /// Configured document path for a dotted key such as `q.nodes`.
    pub fn path(&self, key: &str) -> Result<String> {
        self.config
            .read()
            .path_str(key)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingPath {
                key: key.to_string(),
            })
    }
}

impl fmt::Debug for PaneContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaneContext")
            .field("bus", &self.bus)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Callbacks that undo what a mount did. Run in reverse registration order.
#[derive(Default)]
pub struct Cleanup {
    actions: Vec<Box<dyn FnOnce() + Send>>,
}

impl Cleanup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl FnOnce() + Send + 'static) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn run(self) {
        for action in self.actions.into_iter().rev() {
            action();
        }
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// Listener tasks owned by one mount, stopped together.
#[derive(Debug, Default)]
pub struct ListenerScope {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl ListenerScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `listener` until it finishes or the scope is cancelled.
    ///
    /// Without a tokio runtime the listener is dropped with a warning.
    pub fn spawn<F>(&mut self, listener: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime; listener not started");
            return;
        };
        let token = self.token.clone();
        self.handles.push(handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = listener => {}
            }
        }));
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Listener tasks still running.
    pub fn active(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Ticket identifying one render invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket(u64);

/// Last-invocation-wins gate for asynchronous renders.
#[derive(Debug, Clone, Default)]
pub struct RenderGuard {
    generation: Arc<AtomicU64>,
}

impl RenderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render. Any earlier ticket stops being current.
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Resources held by a mounted pane.
pub struct MountState {
    surface: Arc<Surface>,
    ctx: PaneContext,
    subscriptions: Vec<Subscription>,
    cleanup: Cleanup,
    scope: ListenerScope,
}

impl MountState {
    pub fn new(surface: Arc<Surface>, ctx: PaneContext) -> Self {
        Self {
            surface,
            ctx,
            subscriptions: Vec::new(),
            cleanup: Cleanup::new(),
            scope: ListenerScope::new(),
        }
    }

    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    pub fn ctx(&self) -> &PaneContext {
        &self.ctx
    }

    /// Keep a bus subscription until release.
    pub fn track(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn on_cleanup(&mut self, action: impl FnOnce() + Send + 'static) {
        self.cleanup.push(action);
    }

    pub fn scope(&mut self) -> &mut ListenerScope {
        &mut self.scope
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Undo the mount: cleanup callbacks, bus subscriptions, listener tasks,
    /// then blank the surface.
    pub fn release(self) {
        let Self {
            surface,
            subscriptions,
            cleanup,
            scope,
            ..
        } = self;

        cleanup.run();
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        scope.cancel();
        surface.clear();
    }
}

impl fmt::Debug for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountState")
            .field("surface", &self.surface.name())
            .field("subscriptions", &self.subscriptions.len())
            .field("cleanup", &self.cleanup)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Run a render future on the current runtime.
///
/// Without a runtime the render is skipped with a warning.
pub fn spawn_render<F>(render: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(render)),
        Err(_) => {
            tracing::warn!("no async runtime; render skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn newer_render_makes_older_ticket_stale() {
        let guard = RenderGuard::new();
        let first = guard.begin();
        assert!(guard.is_current(first));

        let second = guard.begin();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));

        guard.invalidate();
        assert!(!guard.is_current(second));
    }

    #[test]
    fn cleanup_runs_in_reverse_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut cleanup = Cleanup::new();
        for i in 0..3 {
            let order = order.clone();
            cleanup.push(move || order.lock().push(i));
        }
        assert_eq!(cleanup.len(), 3);
        cleanup.run();
        assert_eq!(*order.lock(), vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn cancelled_scope_stops_listeners() {
        let mut scope = ListenerScope::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        scope.spawn(async move {
            loop {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(scope.active(), 1);

        scope.cancel();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(scope.active(), 0);
        assert!(scope.is_cancelled());

        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn spawn_without_runtime_is_skipped() {
        let mut scope = ListenerScope::new();
        scope.spawn(async {});
        assert_eq!(scope.active(), 0);
        assert!(spawn_render(async {}).is_none());
    }
}
