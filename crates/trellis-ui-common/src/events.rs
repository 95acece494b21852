//! Event types carried on the [`EventBus`](crate::bus::EventBus).

use serde::{Deserialize, Serialize};
use trellis_core::QueryKind;

/// A payload type published on the bus under a fixed name.
pub trait BusEvent: Clone + Send + Sync + 'static {
    /// Name the event is registered and rebroadcast under.
    const NAME: &'static str;
}

/// A tab became visible.
///
/// Panes compare `view` with their own id and ignore activations meant for
/// other panes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabActivated {
    pub view: String,
    /// Optional query path to run instead of the pane's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl TabActivated {
    pub fn new(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

impl BusEvent for TabActivated {
    const NAME: &'static str = "tab:activated";
}

/// What kind of write touched the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreAction {
    /// An update request was applied.
    Update,
    /// The store was rebuilt from its datasets.
    Reload,
}

/// A pane wrote to the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChanged {
    /// Id of the pane that performed the write.
    pub source: String,
    pub action: StoreAction,
}

impl BusEvent for StoreChanged {
    const NAME: &'static str = "store:changed";
}

/// The store finished bootstrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreReady {
    pub datasets: usize,
}

impl BusEvent for StoreReady {
    const NAME: &'static str = "store:ready";
}

/// A pane painted a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCompleted {
    pub pane: String,
    pub source: String,
    pub kind: QueryKind,
    pub elapsed_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
}

impl BusEvent for QueryCompleted {
    const NAME: &'static str = "query:completed";
}
