//! # Trellis UI Common
//!
//! Orchestration core shared by every Trellis pane.
//!
//! Panes are independently authored UI modules that query one shared graph
//! store. This crate gives them the pieces they need to cooperate without
//! knowing about each other.
//!
//! ## Architecture
//!
//! ```text
//! ConfigOverlay ──► StoreContext ──► QueryService ──► panes
//!                                                      ▲ │
//!                                  EventBus ◄──────────┘ ▼
//!                                     └──► CompatBridge (legacy listeners)
//! ```
//!
//! ## Core Components
//!
//! - [`UiService`]: Facade wiring configuration, store, bus and panes
//! - [`ConfigOverlay`]: Compiled-in defaults plus persisted overrides
//! - [`StoreContext`]: Single-flight, ordered bootstrap of the [`GraphStore`]
//! - [`QueryService`]: Read/write dispatch and row normalization
//! - [`EventBus`]: Typed synchronous publish/subscribe
//! - [`Pane`]: Lifecycle contract with [`MountState`] and [`RenderGuard`]
//!
//! ## Usage
//!
//! ```ignore
//! use trellis_ui_common::UiService;
//!
//! let service = UiService::builder()
//!     .engine_factory(factory)
//!     .fetcher(fetcher)
//!     .build()?;
//!
//! let rows = service
//!     .queries()
//!     .await?
//!     .run_text("SELECT ?s WHERE { ?s ?p ?o }", "inline")
//!     .await?;
//! ```

pub mod bus;
pub mod compat;
pub mod config;
pub mod error;
pub mod events;
pub mod pane;
pub mod query;
pub mod service;
pub mod store;
pub mod surface;
pub mod testing;

// Re-exports for convenience
pub use bus::{EventBus, Subscription, SubscriptionId};
pub use compat::{CompatBridge, LegacyEvent};
pub use config::{
    ConfigOverlay, ConfigSnapshot, Dataset, OverlayOutcome, PathNode, PathTree, Theme,
};
pub use error::{Error, Result};
pub use events::{BusEvent, QueryCompleted, StoreAction, StoreChanged, StoreReady, TabActivated};
pub use pane::{
    spawn_render, Cleanup, ListenerScope, MountState, Pane, PaneContext, RenderGuard,
    RenderTicket,
};
pub use query::{QueryOutcome, QueryResult, QueryService, Row};
pub use service::{UiService, UiServiceBuilder};
pub use store::{looks_like_markup, GraphStore, StoreContext};
pub use surface::{QueryInput, Surface, SurfaceAction, View};
