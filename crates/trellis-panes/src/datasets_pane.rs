/// Datasets Pane - configured datasets and store state
///
/// Lists every dataset (path and base) in load order with a title telling
/// whether the store is loaded. Repaints when the store becomes ready or
/// changes, on resume and on surface refresh.
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use trellis_ui_common::{
    Error, MountState, Pane, PaneContext, Result, StoreChanged, StoreReady, Surface,
    SurfaceAction, View,
};

pub struct DatasetsPane {
    id: String,
    state: Option<MountState>,
}

impl DatasetsPane {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: None,
        }
    }
}

/// Paint the dataset list for the context's store.
pub fn paint_datasets(surface: &Surface, ctx: &PaneContext) {
    let title = match ctx.store.get_store() {
        Ok(store) => format!(
            "Datasets (loaded {})",
            store.loaded_at().format("%Y-%m-%d %H:%M:%S UTC")
        ),
        Err(_) => "Datasets (store not loaded)".to_string(),
    };

    let items = ctx
        .store
        .datasets()
        .iter()
        .map(|dataset| {
            if dataset.base.is_empty() {
                dataset.path.clone()
            } else {
                format!("{} <{}>", dataset.path, dataset.base)
            }
        })
        .collect();

    surface.paint(View::List { title, items });
}

impl Pane for DatasetsPane {
    fn id(&self) -> &str {
        &self.id
    }

    fn mount(&mut self, surface: Arc<Surface>, ctx: PaneContext) -> Result<()> {
        if self.state.is_some() {
            return Err(Error::AlreadyMounted {
                pane: self.id.clone(),
            });
        }

        let mut state = MountState::new(Arc::clone(&surface), ctx.clone());
        paint_datasets(&surface, &ctx);

        {
            let (surface, repaint_ctx) = (Arc::clone(&surface), ctx.clone());
            state.track(ctx.bus.on::<StoreReady, _>(move |_| {
                paint_datasets(&surface, &repaint_ctx);
            }));
        }
        {
            let (surface, repaint_ctx) = (Arc::clone(&surface), ctx.clone());
            state.track(ctx.bus.on::<StoreChanged, _>(move |_| {
                paint_datasets(&surface, &repaint_ctx);
            }));
        }
        {
            let (listener_surface, repaint_ctx) = (Arc::clone(&surface), ctx.clone());
            let id = self.id.clone();
            let mut actions = surface.actions();
            state.scope().spawn(async move {
                loop {
                    match actions.recv().await {
                        Ok(SurfaceAction::Refresh) => {
                            paint_datasets(&listener_surface, &repaint_ctx)
                        }
                        Ok(SurfaceAction::Submit(_)) => {
                            tracing::debug!(pane = %id, "ignoring submitted query");
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }

        self.state = Some(state);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let state = self.state.as_ref().ok_or_else(|| Error::NotMounted {
            pane: self.id.clone(),
        })?;
        paint_datasets(state.surface(), state.ctx());
        Ok(())
    }

    fn suspend(&mut self) -> Result<()> {
        match self.state {
            Some(_) => Ok(()),
            None => Err(Error::NotMounted {
                pane: self.id.clone(),
            }),
        }
    }

    fn unmount(&mut self) {
        if let Some(state) = self.state.take() {
            state.release();
        }
    }

    fn is_mounted(&self) -> bool {
        self.state.is_some()
    }
}

impl std::fmt::Debug for DatasetsPane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetsPane")
            .field("id", &self.id)
            .field("mounted", &self.state.is_some())
            .finish()
    }
}
