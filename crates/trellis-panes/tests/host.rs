//! Tab sequencing through the pane host.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{is_table_for, service, wait_for};
use trellis_ui_common::testing::ScriptedEngine;
use trellis_ui_common::{Error, Pane, TabActivated, View};
use trellis_panes::{PaneHost, PaneRegistry, QueryPane};

#[tokio::test]
async fn activation_mounts_on_first_use_and_suspends_previous() {
    let engine = ScriptedEngine::new();
    let service = service(&engine);
    let mut host = PaneHost::with_registry(service.pane_context(), &PaneRegistry::new());

    let activations = Arc::new(AtomicUsize::new(0));
    let counter = activations.clone();
    let subscription = service.bus().on::<TabActivated, _>(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(host.ids().iter().all(|id| !host.pane(id).unwrap().is_mounted()));

    host.activate("nodes").unwrap();
    assert_eq!(host.active(), Some("nodes"));
    let nodes_surface = host.surface("nodes").unwrap();
    wait_for(&nodes_surface, |v| is_table_for(v, "queries/nodes.rq")).await;

    host.activate("edges").unwrap();
    let nodes = host.pane("nodes").and_then(|p| p.as_query()).unwrap();
    assert!(nodes.is_mounted());
    assert!(!nodes.is_active());
    assert!(host.pane("edges").unwrap().is_mounted());
    assert!(!host.pane("datasets").unwrap().is_mounted());

    // Back to an already mounted pane: resumed, not mounted again
    host.activate("nodes").unwrap();
    assert!(host.pane("nodes").and_then(|p| p.as_query()).unwrap().is_active());
    assert_eq!(activations.load(Ordering::SeqCst), 3);

    subscription.unsubscribe();
    host.shutdown();
    assert_eq!(service.bus().total_subscribers(), 0);
    assert_eq!(host.active(), None);
}

#[tokio::test]
async fn activation_can_override_the_query() {
    let engine = ScriptedEngine::new();
    let service = service(&engine);
    let mut host = PaneHost::with_registry(service.pane_context(), &PaneRegistry::new());

    host.activate_with("classes", Some("queries/edges.rq".into()))
        .unwrap();
    let surface = host.surface("classes").unwrap();
    wait_for(&surface, |v| is_table_for(v, "queries/edges.rq")).await;
    host.shutdown();
}

#[tokio::test]
async fn unknown_views_are_rejected() {
    let engine = ScriptedEngine::new();
    let service = service(&engine);
    let mut host = PaneHost::new(service.pane_context());

    assert!(matches!(host.activate("nodes"), Err(Error::UnknownPane(id)) if id == "nodes"));
    assert!(matches!(host.close("nodes"), Err(Error::UnknownPane(_))));
}

#[tokio::test]
async fn close_unmounts_and_next_activation_mounts_fresh() {
    let engine = ScriptedEngine::new();
    let service = service(&engine);
    let mut host = PaneHost::new(service.pane_context());
    let surface = host.add(QueryPane::new("nodes", "q.nodes"));

    host.activate("nodes").unwrap();
    host.close("nodes").unwrap();
    assert_eq!(host.active(), None);
    assert!(!host.pane("nodes").unwrap().is_mounted());
    assert_eq!(surface.view(), View::Blank);
    assert_eq!(service.bus().total_subscribers(), 0);

    host.activate("nodes").unwrap();
    assert!(host.pane("nodes").unwrap().is_mounted());
    assert_eq!(service.bus().total_subscribers(), 2);
    host.shutdown();
}

#[tokio::test]
async fn failed_mount_keeps_the_previous_pane_visible() {
    let engine = ScriptedEngine::new();
    let service = service(&engine);
    let mut host = PaneHost::new(service.pane_context());
    host.add(QueryPane::new("nodes", "q.nodes"));
    host.add(QueryPane::new("broken", "q.missing"));

    host.activate("nodes").unwrap();
    let err = host.activate("broken").unwrap_err();
    assert!(matches!(err, Error::MissingPath { key } if key == "q.missing"));

    assert_eq!(host.active(), Some("nodes"));
    assert!(host.pane("nodes").and_then(|p| p.as_query()).unwrap().is_active());
    assert!(!host.pane("broken").unwrap().is_mounted());
    host.shutdown();
}
