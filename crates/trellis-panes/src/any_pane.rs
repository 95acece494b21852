use std::sync::Arc;

use trellis_ui_common::{Pane, PaneContext, Result, Surface};

use crate::datasets_pane::DatasetsPane;
use crate::query_pane::QueryPane;
use crate::update_pane::UpdatePane;

/// Any of the built-in panes.
#[derive(Debug)]
pub enum AnyPane {
    Query(QueryPane),
    Update(UpdatePane),
    Datasets(DatasetsPane),
}

impl AnyPane {
    fn inner(&self) -> &dyn Pane {
        match self {
            AnyPane::Query(pane) => pane,
            AnyPane::Update(pane) => pane,
            AnyPane::Datasets(pane) => pane,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Pane {
        match self {
            AnyPane::Query(pane) => pane,
            AnyPane::Update(pane) => pane,
            AnyPane::Datasets(pane) => pane,
        }
    }

    pub fn as_query(&self) -> Option<&QueryPane> {
        match self {
            AnyPane::Query(pane) => Some(pane),
            _ => None,
        }
    }

    pub fn as_update(&self) -> Option<&UpdatePane> {
        match self {
            AnyPane::Update(pane) => Some(pane),
            _ => None,
        }
    }
}

impl Pane for AnyPane {
    fn id(&self) -> &str {
        self.inner().id()
    }

    fn mount(&mut self, surface: Arc<Surface>, ctx: PaneContext) -> Result<()> {
        self.inner_mut().mount(surface, ctx)
    }

    fn resume(&mut self) -> Result<()> {
        self.inner_mut().resume()
    }

    fn suspend(&mut self) -> Result<()> {
        self.inner_mut().suspend()
    }

    fn unmount(&mut self) {
        self.inner_mut().unmount()
    }

    fn is_mounted(&self) -> bool {
        self.inner().is_mounted()
    }
}

impl From<QueryPane> for AnyPane {
    fn from(pane: QueryPane) -> Self {
        AnyPane::Query(pane)
    }
}

impl From<UpdatePane> for AnyPane {
    fn from(pane: UpdatePane) -> Self {
        AnyPane::Update(pane)
    }
}

impl From<DatasetsPane> for AnyPane {
    fn from(pane: DatasetsPane) -> Self {
        AnyPane::Datasets(pane)
    }
}
