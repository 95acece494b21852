//! # Trellis Panes
//!
//! Built-in panes for the Trellis workbench and a minimal host that drives
//! their lifecycle.
//!
//! - [`QueryPane`]: runs a read query and paints a table
//! - [`UpdatePane`]: applies write queries and announces store changes
//! - [`DatasetsPane`]: lists the configured datasets and the store state
//! - [`AnyPane`]: any of the above behind one [`Pane`](trellis_ui_common::Pane)
//! - [`PaneHost`]: mounts, suspends and resumes panes as tabs are activated
//! - [`PaneRegistry`]: the default views and their hotkeys

pub mod any_pane;
pub mod datasets_pane;
pub mod host;
pub mod query_pane;
pub mod registry;
pub mod render;
pub mod update_pane;

pub use any_pane::AnyPane;
pub use datasets_pane::DatasetsPane;
pub use host::PaneHost;
pub use query_pane::QueryPane;
pub use registry::{PaneKind, PaneRegistry, PaneSpec};
pub use render::{result_view, QueryRenderer};
pub use update_pane::UpdatePane;
