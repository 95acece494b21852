/// Query Pane - runs a read query and shows its rows
///
/// The query pane provides:
/// - A default query document taken from the configured paths
/// - Activation through `TabActivated`, optionally with another query path
/// - Refresh when another pane writes to the store
/// - Ad-hoc queries submitted on its surface
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use trellis_ui_common::{
    Error, MountState, Pane, PaneContext, QueryInput, RenderGuard, Result, StoreChanged,
    Surface, SurfaceAction, TabActivated, View,
};
use uuid::Uuid;

use crate::render::QueryRenderer;

#[derive(Debug, Default)]
struct Flags {
    /// Visible and allowed to re-run on store changes.
    active: AtomicBool,
    /// The store changed while hidden.
    stale: AtomicBool,
}

pub struct QueryPane {
    id: String,
    query_key: String,
    instance: Uuid,
    guard: RenderGuard,
    flags: Arc<Flags>,
    mounted: Option<Mounted>,
}

struct Mounted {
    state: MountState,
    renderer: QueryRenderer,
}

impl QueryPane {
    /// Pane `id` running the document configured under `query_key`
    /// (e.g. `q.nodes`).
    pub fn new(id: impl Into<String>, query_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query_key: query_key.into(),
            instance: Uuid::new_v4(),
            guard: RenderGuard::new(),
            flags: Arc::new(Flags::default()),
            mounted: None,
        }
    }

    pub fn query_key(&self) -> &str {
        &self.query_key
    }

    pub fn is_active(&self) -> bool {
        self.flags.active.load(Ordering::Acquire)
    }

    pub fn is_stale(&self) -> bool {
        self.flags.stale.load(Ordering::Acquire)
    }

    /// Run `input` now, superseding any render in flight.
    pub fn render(&self, input: QueryInput) -> Result<Option<JoinHandle<()>>> {
        Ok(self.mounted()?.renderer.render(input))
    }

    fn mounted(&self) -> Result<&Mounted> {
        self.mounted.as_ref().ok_or_else(|| Error::NotMounted {
            pane: self.id.clone(),
        })
    }
}

impl Pane for QueryPane {
    fn id(&self) -> &str {
        &self.id
    }

    fn mount(&mut self, surface: Arc<Surface>, ctx: PaneContext) -> Result<()> {
        if self.mounted.is_some() {
            return Err(Error::AlreadyMounted {
                pane: self.id.clone(),
            });
        }

        let path = ctx.path(&self.query_key)?;
        let default = QueryInput::Path(path.clone());
        let renderer = QueryRenderer::new(
            &self.id,
            ctx.clone(),
            Arc::clone(&surface),
            self.guard.clone(),
            Some(default.clone()),
        );
        let mut state = MountState::new(Arc::clone(&surface), ctx.clone());

        surface.paint(View::message(format!("{path}: not run yet")));

        {
            let id = self.id.clone();
            let flags = Arc::clone(&self.flags);
            let renderer = renderer.clone();
            state.track(ctx.bus.on::<TabActivated, _>(move |event| {
                if event.view != id {
                    return;
                }
                flags.active.store(true, Ordering::Release);
                flags.stale.store(false, Ordering::Release);
                let input = event
                    .query
                    .clone()
                    .map(QueryInput::Path)
                    .unwrap_or_else(|| default.clone());
                renderer.render(input);
            }));
        }

        {
            let id = self.id.clone();
            let flags = Arc::clone(&self.flags);
            let renderer = renderer.clone();
            state.track(ctx.bus.on::<StoreChanged, _>(move |event| {
                if event.source == id {
                    return;
                }
                if flags.active.load(Ordering::Acquire) {
                    renderer.rerender();
                } else {
                    flags.stale.store(true, Ordering::Release);
                }
            }));
        }

        {
            let id = self.id.clone();
            let renderer = renderer.clone();
            let mut actions = surface.actions();
            state.scope().spawn(async move {
                loop {
                    match actions.recv().await {
                        Ok(SurfaceAction::Submit(input)) => {
                            renderer.render(input);
                        }
                        Ok(SurfaceAction::Refresh) => {
                            renderer.rerender();
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(pane = %id, skipped, "surface actions dropped");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        {
            let guard = self.guard.clone();
            let flags = Arc::clone(&self.flags);
            state.on_cleanup(move || {
                guard.invalidate();
                flags.active.store(false, Ordering::Release);
                flags.stale.store(false, Ordering::Release);
            });
        }

        tracing::debug!(pane = %self.id, instance = %self.instance, query = %path, "mounted");
        self.mounted = Some(Mounted { state, renderer });
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let mounted = self.mounted()?;
        self.flags.active.store(true, Ordering::Release);
        if self.flags.stale.swap(false, Ordering::AcqRel) {
            tracing::debug!(pane = %self.id, "refreshing stale results");
            mounted.renderer.rerender();
        }
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        self.mounted()?;
        self.flags.active.store(false, Ordering::Release);
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.state.release();
            tracing::debug!(pane = %self.id, instance = %self.instance, "unmounted");
        }
    }

    fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }
}

impl std::fmt::Debug for QueryPane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPane")
            .field("id", &self.id)
            .field("query_key", &self.query_key)
            .field("instance", &self.instance)
            .field("flags", &self.flags)
            .field("mounted", &self.mounted.is_some())
            .finish()
    }
}
