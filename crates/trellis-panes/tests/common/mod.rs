#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use trellis_core::{Binding, MemoryFetcher, Term};
use trellis_ui_common::testing::ScriptedEngine;
use trellis_ui_common::{Surface, UiService, View};

pub const DOCUMENTS: &[(&str, &str)] = &[
    ("data/ontology.ttl", "define Thing"),
    ("data/instances.ttl", "use Thing"),
    ("queries/nodes.rq", "SELECT NODES"),
    ("queries/edges.rq", "SELECT EDGES"),
    ("queries/classes.rq", "SELECT CLASSES"),
    ("queries/slow.rq", "SELECT SLOW"),
    ("queries/fast.rq", "SELECT FAST"),
];

pub fn row(variable: &str, iri: &str) -> Binding {
    Binding::from_pairs([(variable, Term::named(iri))])
}

pub fn service(engine: &Arc<ScriptedEngine>) -> UiService {
    UiService::builder()
        .engine_factory(engine.factory())
        .fetcher(Arc::new(MemoryFetcher::with_documents(DOCUMENTS.iter().copied())))
        .build()
        .expect("service builds")
}

/// Number of queries the engine received that contain `needle`.
pub fn queries_containing(engine: &ScriptedEngine, needle: &str) -> usize {
    engine
        .queries()
        .iter()
        .filter(|text| text.contains(needle))
        .count()
}

/// Poll `surface` until its view satisfies `pred`.
pub async fn wait_for(surface: &Surface, pred: impl Fn(&View) -> bool) -> View {
    for _ in 0..400 {
        let view = surface.view();
        if pred(&view) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("surface {} never reached the expected view: {:?}", surface.name(), surface.view());
}

/// Poll `check` until it holds.
pub async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never held");
}

pub fn is_table_for(view: &View, source: &str) -> bool {
    matches!(view, View::Table { caption, .. } if caption.starts_with(source))
}
