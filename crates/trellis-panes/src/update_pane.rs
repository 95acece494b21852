/// Update Pane - editor for write queries
///
/// Queries submitted on the surface are classified and executed. Writes paint
/// a summary and announce `StoreChanged` so other panes refresh; reads are
/// shown as tables.
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use trellis_ui_common::{
    Error, MountState, Pane, PaneContext, QueryInput, RenderGuard, Result, Surface,
    SurfaceAction, View,
};

use crate::render::QueryRenderer;

pub struct UpdatePane {
    id: String,
    guard: RenderGuard,
    mounted: Option<Mounted>,
}

struct Mounted {
    state: MountState,
    renderer: QueryRenderer,
}

impl UpdatePane {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            guard: RenderGuard::new(),
            mounted: None,
        }
    }

    /// Execute `input` as if it was submitted on the surface.
    pub fn submit(&self, input: QueryInput) -> Result<Option<JoinHandle<()>>> {
        let mounted = self.mounted.as_ref().ok_or_else(|| Error::NotMounted {
            pane: self.id.clone(),
        })?;
        Ok(mounted.renderer.render(input))
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.mounted.is_none() {
            return Err(Error::NotMounted {
                pane: self.id.clone(),
            });
        }
        Ok(())
    }
}

impl Pane for UpdatePane {
    fn id(&self) -> &str {
        &self.id
    }

    fn mount(&mut self, surface: Arc<Surface>, ctx: PaneContext) -> Result<()> {
        if self.mounted.is_some() {
            return Err(Error::AlreadyMounted {
                pane: self.id.clone(),
            });
        }

        let renderer = QueryRenderer::new(
            &self.id,
            ctx.clone(),
            Arc::clone(&surface),
            self.guard.clone(),
            None,
        );
        let mut state = MountState::new(Arc::clone(&surface), ctx);

        surface.paint(View::message("Submit an update to apply it to the store"));

        let id = self.id.clone();
        let listener = renderer.clone();
        let mut actions = surface.actions();
        state.scope().spawn(async move {
            loop {
                match actions.recv().await {
                    Ok(SurfaceAction::Submit(input)) => {
                        listener.render(input);
                    }
                    // Re-running a write is never implicit
                    Ok(SurfaceAction::Refresh) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(pane = %id, skipped, "surface actions dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let guard = self.guard.clone();
        state.on_cleanup(move || guard.invalidate());

        self.mounted = Some(Mounted { state, renderer });
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.ensure_mounted()
    }

    fn suspend(&mut self) -> Result<()> {
        self.ensure_mounted()
    }

    fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.state.release();
        }
    }

    fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }
}

impl std::fmt::Debug for UpdatePane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatePane")
            .field("id", &self.id)
            .field("mounted", &self.mounted.is_some())
            .finish()
    }
}
