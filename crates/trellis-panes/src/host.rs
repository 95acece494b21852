//! Minimal pane manager.
//!
//! [`PaneHost`] plays the role of the tab bar: it owns one surface per view,
//! mounts panes on first use, suspends the previously visible pane and
//! announces every activation on the bus.

use std::sync::Arc;

use trellis_ui_common::{Error, Pane, PaneContext, Result, Surface, TabActivated};

use crate::any_pane::AnyPane;
use crate::registry::PaneRegistry;

struct Hosted {
    pane: AnyPane,
    surface: Arc<Surface>,
}

pub struct PaneHost {
    ctx: PaneContext,
    panes: Vec<Hosted>,
    active: Option<String>,
}

impl PaneHost {
    pub fn new(ctx: PaneContext) -> Self {
        Self {
            ctx,
            panes: Vec::new(),
            active: None,
        }
    }

    /// Host with one pane per registered view, in tab order.
    pub fn with_registry(ctx: PaneContext, registry: &PaneRegistry) -> Self {
        let mut host = Self::new(ctx);
        for spec in registry.all() {
            host.add(spec.create());
        }
        host
    }

    /// Add a pane, replacing (and unmounting) any pane with the same id.
    pub fn add(&mut self, pane: impl Into<AnyPane>) -> Arc<Surface> {
        let pane = pane.into();
        let surface = Surface::new(pane.id());

        if let Some(existing) = self.find_mut(pane.id()) {
            existing.pane.unmount();
            existing.pane = pane;
            existing.surface = Arc::clone(&surface);
        } else {
            self.panes.push(Hosted {
                pane,
                surface: Arc::clone(&surface),
            });
        }
        surface
    }

    /// Show `view`: suspend the visible pane, mount or resume the target and
    /// announce the activation.
    pub fn activate(&mut self, view: &str) -> Result<()> {
        self.activate_with(view, None)
    }

    /// Like [`activate`](Self::activate), asking the pane to run `query`
    /// instead of its default.
    pub fn activate_with(&mut self, view: &str, query: Option<String>) -> Result<()> {
        if self.find(view).is_none() {
            return Err(Error::UnknownPane(view.to_string()));
        }

        let previous = self.active.take();
        if let Some(hidden) = previous.as_deref().filter(|p| *p != view) {
            let suspended = match self.find_mut(hidden) {
                Some(hosted) if hosted.pane.is_mounted() => hosted.pane.suspend(),
                _ => Ok(()),
            };
            if let Err(e) = suspended {
                self.active = previous;
                return Err(e);
            }
        }

        if let Err(e) = self.show(view) {
            tracing::warn!(view, error = %e, "activation failed");
            if let Some(previous) = previous {
                self.restore(&previous);
                self.active = Some(previous);
            }
            return Err(e);
        }
        self.active = Some(view.to_string());

        let mut event = TabActivated::new(view);
        event.query = query;
        tracing::debug!(view, "tab activated");
        self.ctx.bus.emit(event);
        Ok(())
    }

    /// Unmount `view`. The pane is mounted again on its next activation.
    pub fn close(&mut self, view: &str) -> Result<()> {
        let hosted = self
            .find_mut(view)
            .ok_or_else(|| Error::UnknownPane(view.to_string()))?;
        hosted.pane.unmount();
        if self.active.as_deref() == Some(view) {
            self.active = None;
        }
        Ok(())
    }

    /// Unmount every pane.
    pub fn shutdown(&mut self) {
        for hosted in &mut self.panes {
            hosted.pane.unmount();
        }
        self.active = None;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.panes.iter().map(|hosted| hosted.pane.id()).collect()
    }

    pub fn pane(&self, view: &str) -> Option<&AnyPane> {
        self.find(view).map(|hosted| &hosted.pane)
    }

    pub fn surface(&self, view: &str) -> Option<Arc<Surface>> {
        self.find(view).map(|hosted| Arc::clone(&hosted.surface))
    }

    pub fn context(&self) -> &PaneContext {
        &self.ctx
    }

    /// Mount `view` if needed and resume it.
    fn show(&mut self, view: &str) -> Result<()> {
        let ctx = self.ctx.clone();
        let hosted = self
            .find_mut(view)
            .ok_or_else(|| Error::UnknownPane(view.to_string()))?;
        if !hosted.pane.is_mounted() {
            hosted.pane.mount(Arc::clone(&hosted.surface), ctx)?;
        }
        hosted.pane.resume()
    }

    /// Make a previously visible pane visible again after a failed switch.
    fn restore(&mut self, view: &str) {
        if let Some(hosted) = self.find_mut(view) {
            if hosted.pane.is_mounted() {
                if let Err(e) = hosted.pane.resume() {
                    tracing::warn!(view, error = %e, "could not resume previous pane");
                }
            }
        }
    }

    fn find(&self, view: &str) -> Option<&Hosted> {
        self.panes.iter().find(|hosted| hosted.pane.id() == view)
    }

    fn find_mut(&mut self, view: &str) -> Option<&mut Hosted> {
        self.panes.iter_mut().find(|hosted| hosted.pane.id() == view)
    }
}

impl std::fmt::Debug for PaneHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneHost")
            .field("panes", &self.ids())
            .field("active", &self.active)
            .finish()
    }
}
