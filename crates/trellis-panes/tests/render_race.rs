//! Last-invocation-wins rendering.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{is_table_for, queries_containing, row, service, wait_for};
use parking_lot::Mutex;
use trellis_ui_common::testing::ScriptedEngine;
use trellis_ui_common::{Pane, QueryCompleted, QueryInput, Surface, SurfaceAction, View};
use trellis_panes::QueryPane;

fn racing_engine() -> Arc<ScriptedEngine> {
    ScriptedEngine::new()
        .delay("SLOW", Duration::from_millis(150))
        .respond("SLOW", vec![row("x", "urn:a#slow")])
        .respond("FAST", vec![row("x", "urn:a#fast")])
}

#[tokio::test]
async fn only_the_latest_render_is_painted() {
    let engine = racing_engine();
    let service = service(&engine);
    service.init_store().await.unwrap();

    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = completed.clone();
    let subscription = service
        .bus()
        .on::<QueryCompleted, _>(move |event| sink.lock().push(event.source.clone()));

    let surface = Surface::new("nodes");
    let mut pane = QueryPane::new("nodes", "q.nodes");
    pane.mount(surface.clone(), service.pane_context()).unwrap();

    let slow = pane
        .render(QueryInput::Path("queries/slow.rq".into()))
        .unwrap()
        .expect("render spawned");
    let fast = pane
        .render(QueryInput::Path("queries/fast.rq".into()))
        .unwrap()
        .expect("render spawned");

    fast.await.unwrap();
    assert!(is_table_for(&surface.view(), "queries/fast.rq"));

    // The slow render still finishes, it just never paints
    slow.await.unwrap();
    match surface.view() {
        View::Table { caption, rows, .. } => {
            assert!(caption.starts_with("queries/fast.rq"));
            assert_eq!(rows, vec![vec!["urn:a#fast"]]);
        }
        other => panic!("unexpected view: {other:?}"),
    }
    assert_eq!(queries_containing(&engine, "SLOW"), 1);
    assert_eq!(*completed.lock(), vec!["queries/fast.rq".to_string()]);

    subscription.unsubscribe();
    pane.unmount();
}

#[tokio::test]
async fn unmount_discards_renders_in_flight() {
    let engine = racing_engine();
    let service = service(&engine);

    let surface = Surface::new("nodes");
    let mut pane = QueryPane::new("nodes", "q.nodes");
    pane.mount(surface.clone(), service.pane_context()).unwrap();

    let slow = pane
        .render(QueryInput::Path("queries/slow.rq".into()))
        .unwrap()
        .expect("render spawned");
    assert!(matches!(surface.view(), View::Loading { .. }));

    pane.unmount();
    slow.await.unwrap();
    assert_eq!(surface.view(), View::Blank);
}

#[tokio::test]
async fn engine_errors_paint_an_error_view() {
    let engine = ScriptedEngine::new().fail_queries_containing("BROKEN");
    let service = service(&engine);

    let surface = Surface::new("nodes");
    let mut pane = QueryPane::new("nodes", "q.nodes");
    pane.mount(surface.clone(), service.pane_context()).unwrap();

    surface.dispatch(SurfaceAction::Submit(QueryInput::Text("SELECT BROKEN".into())));
    let view = wait_for(&surface, View::is_error).await;
    assert!(matches!(view, View::Error { subject, message }
        if subject == "inline" && message.contains("BROKEN")));

    // The pane keeps working after a failure
    surface.dispatch(SurfaceAction::Submit(QueryInput::Path("queries/fast.rq".into())));
    wait_for(&surface, |v| is_table_for(v, "queries/fast.rq")).await;
    pane.unmount();
}

#[tokio::test]
async fn bootstrap_failure_stays_inside_the_pane() {
    let engine = ScriptedEngine::new();
    let service = trellis_ui_common::UiService::builder()
        .engine_factory(engine.factory())
        .fetcher(Arc::new(trellis_core::MemoryFetcher::with_documents([(
            "queries/nodes.rq",
            "SELECT NODES",
        )])))
        .build()
        .unwrap();

    let surface = Surface::new("nodes");
    let mut pane = QueryPane::new("nodes", "q.nodes");
    pane.mount(surface.clone(), service.pane_context()).unwrap();

    surface.dispatch(SurfaceAction::Refresh);
    let view = wait_for(&surface, View::is_error).await;
    assert!(matches!(view, View::Error { message, .. } if message.contains("data/ontology.ttl")));
    assert!(!service.store().is_initialized());
    pane.unmount();
}
