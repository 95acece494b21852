use serde::Serialize;
use trellis_ui_common::{Error, Result};

use crate::any_pane::AnyPane;
use crate::datasets_pane::DatasetsPane;
use crate::query_pane::QueryPane;
use crate::update_pane::UpdatePane;

/// Which pane implementation backs a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneKind {
    Query,
    Update,
    Datasets,
}

/// Static description of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub hotkey: char,
    pub kind: PaneKind,
    /// Dotted config key of the default query, for query panes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_key: Option<&'static str>,
}

impl PaneSpec {
    /// Fresh, unmounted pane for this view.
    pub fn create(&self) -> AnyPane {
        match self.kind {
            PaneKind::Query => {
                AnyPane::Query(QueryPane::new(self.id, self.query_key.unwrap_or_default()))
            }
            PaneKind::Update => AnyPane::Update(UpdatePane::new(self.id)),
            PaneKind::Datasets => AnyPane::Datasets(DatasetsPane::new(self.id)),
        }
    }
}

/// Known views, in tab order.
#[derive(Debug, Clone)]
pub struct PaneRegistry {
    specs: Vec<PaneSpec>,
}

impl PaneRegistry {
    pub fn new() -> Self {
        let specs = vec![
            PaneSpec {
                id: "nodes",
                label: "Nodes",
                hotkey: '1',
                kind: PaneKind::Query,
                query_key: Some("q.nodes"),
            },
            PaneSpec {
                id: "edges",
                label: "Edges",
                hotkey: '2',
                kind: PaneKind::Query,
                query_key: Some("q.edges"),
            },
            PaneSpec {
                id: "classes",
                label: "Classes",
                hotkey: '3',
                kind: PaneKind::Query,
                query_key: Some("q.classes"),
            },
            PaneSpec {
                id: "editor",
                label: "Editor",
                hotkey: 'e',
                kind: PaneKind::Update,
                query_key: None,
            },
            PaneSpec {
                id: "datasets",
                label: "Datasets",
                hotkey: 'd',
                kind: PaneKind::Datasets,
                query_key: None,
            },
        ];

        PaneRegistry { specs }
    }

    pub fn get(&self, id: &str) -> Option<&PaneSpec> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    pub fn label(&self, id: &str) -> Option<&'static str> {
        self.get(id).map(|spec| spec.label)
    }

    pub fn all(&self) -> &[PaneSpec] {
        &self.specs
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.specs.iter().map(|spec| spec.id).collect()
    }

    pub fn hotkeys(&self) -> Vec<(&'static str, char)> {
        self.specs.iter().map(|spec| (spec.id, spec.hotkey)).collect()
    }

    pub fn by_hotkey(&self, key: char) -> Option<&PaneSpec> {
        self.specs.iter().find(|spec| spec.hotkey == key)
    }

    pub fn create(&self, id: &str) -> Result<AnyPane> {
        self.get(id)
            .map(PaneSpec::create)
            .ok_or_else(|| Error::UnknownPane(id.to_string()))
    }
}

impl Default for PaneRegistry {
    fn default() -> Self {
        Self::new()
    }
}
