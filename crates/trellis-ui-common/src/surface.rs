//! Mount root for panes.
//!
//! Panes never draw. They paint a [`View`] onto their [`Surface`] and read user
//! input from it as [`SurfaceAction`]s; whatever front end owns the surface
//! decides how to present it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of the per-surface action channel.
const ACTION_CAPACITY: usize = 64;

/// View model painted by a pane.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    #[default]
    Blank,
    Loading {
        label: String,
    },
    Table {
        caption: String,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Message {
        text: String,
    },
    List {
        title: String,
        items: Vec<String>,
    },
    Error {
        subject: String,
        message: String,
    },
}

impl View {
    pub fn loading(label: impl Into<String>) -> Self {
        View::Loading {
            label: label.into(),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        View::Message { text: text.into() }
    }

    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        View::Error {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, View::Error { .. })
    }
}

/// Query submitted from a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryInput {
    /// Run the document at this path.
    Path(String),
    /// Run this query text.
    Text(String),
}

/// User input arriving on a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAction {
    Submit(QueryInput),
    Refresh,
}

#[derive(Debug)]
struct Painted {
    view: View,
    count: u64,
    at: Option<DateTime<Utc>>,
}

/// Region a pane paints into.
#[derive(Debug)]
pub struct Surface {
    name: String,
    painted: RwLock<Painted>,
    actions: broadcast::Sender<SurfaceAction>,
}

impl Surface {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let (actions, _) = broadcast::channel(ACTION_CAPACITY);
        Arc::new(Self {
            name: name.into(),
            painted: RwLock::new(Painted {
                view: View::Blank,
                count: 0,
                at: None,
            }),
            actions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the current view.
    pub fn paint(&self, view: View) {
        let mut painted = self.painted.write();
        painted.view = view;
        painted.count += 1;
        painted.at = Some(Utc::now());
    }

    /// Back to [`View::Blank`]. Used when a pane releases the surface.
    pub fn clear(&self) {
        self.paint(View::Blank);
    }

    pub fn view(&self) -> View {
        self.painted.read().view.clone()
    }

    /// Number of paints so far.
    pub fn paint_count(&self) -> u64 {
        self.painted.read().count
    }

    pub fn painted_at(&self) -> Option<DateTime<Utc>> {
        self.painted.read().at
    }

    /// Deliver user input to the mounted pane. Returns the number of
    /// listeners reached.
    pub fn dispatch(&self, action: SurfaceAction) -> usize {
        self.actions.send(action).unwrap_or(0)
    }

    pub fn actions(&self) -> broadcast::Receiver<SurfaceAction> {
        self.actions.subscribe()
    }

    /// Number of action listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.actions.receiver_count()
    }
}
