//! # trellis-core: capability boundary for the Trellis workbench
//!
//! Everything the orchestration layer needs from the outside world is a trait
//! defined here:
//!
//! - [`GraphEngine`] / [`EngineFactory`]: the graph store engine (`load`,
//!   `query`, `update`)
//! - [`TextFetcher`]: fetches datasets and query documents as UTF-8 text
//! - [`KvStorage`]: persisted key/value entries (config overlay, theme)
//!
//! It also owns the value model shared by every pane:
//!
//! - [`Term`] / [`Binding`]: engine-independent variable bindings
//! - [`display`]: stable display rendering of terms
//! - [`classify`]: read vs. write classification of query text
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_core::{classify_query, render_term, QueryKind, Term};
//!
//! assert_eq!(classify_query("# seed\nINSERT DATA { }"), QueryKind::Update);
//! assert_eq!(render_term(&Term::blank("b0")), "_:b0");
//! ```

pub mod classify;
pub mod display;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod storage;
pub mod term;

#[cfg(feature = "oxigraph")]
pub mod oxigraph_engine;

pub use classify::{classify_query, is_update_query, QueryKind, UPDATE_VERBS};
pub use display::{parse_display, render_term, DisplayValue};
pub use engine::{EngineFactory, GraphEngine};
pub use error::{CoreError, CoreResult};
pub use fetch::{FetchOptions, FsFetcher, MemoryFetcher, TextFetcher};
pub use storage::{JsonFileStorage, KvStorage, MemoryStorage};
pub use term::{Binding, Term, RDF_LANG_STRING, XSD_STRING};

#[cfg(feature = "oxigraph")]
pub use oxigraph_engine::OxigraphEngine;
