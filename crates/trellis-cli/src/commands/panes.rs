use std::io::Write;
use std::time::Duration;

use serde_json::{Map, Value};
use trellis_panes::{PaneHost, PaneRegistry};
use trellis_ui_common::{Surface, View};

use super::CommandContext;
use crate::output::write_view;

const SETTLE_POLL: Duration = Duration::from_millis(10);

/// Activate each view in turn, wait for its render to finish and print it.
/// Fails after printing when any pane ended on an error view.
pub async fn handle<W: Write>(ctx: &CommandContext, views: Vec<String>, out: &mut W) -> anyhow::Result<()> {
    let service = ctx.service()?;
    let registry = PaneRegistry::new();
    let mut host = PaneHost::with_registry(service.pane_context(), &registry);

    let views = if views.is_empty() {
        registry.ids().into_iter().map(str::to_string).collect()
    } else {
        views
    };

    let mut painted = Vec::with_capacity(views.len());
    for view in &views {
        host.activate(view)?;
        let Some(surface) = host.surface(view) else {
            continue;
        };
        let settled = settle(&surface).await;
        tracing::debug!(view = %view, paints = surface.paint_count(), "pane settled");
        painted.push((view.clone(), settled));
    }
    host.shutdown();

    if ctx.json {
        let map: Map<String, Value> = painted
            .iter()
            .map(|(view, settled)| -> serde_json::Result<(String, Value)> {
                Ok((view.clone(), serde_json::to_value(settled)?))
            })
            .collect::<serde_json::Result<_>>()?;
        writeln!(out, "{}", Value::Object(map))?;
    } else {
        for (view, settled) in &painted {
            let heading = match registry.label(view) {
                Some(label) => format!("{label} ({view})"),
                None => view.clone(),
            };
            write_view(out, &heading, settled)?;
        }
    }

    let failed = painted.iter().filter(|(_, view)| view.is_error()).count();
    if failed > 0 {
        anyhow::bail!("{failed} pane(s) reported errors");
    }
    Ok(())
}

async fn settle(surface: &Surface) -> View {
    loop {
        let view = surface.view();
        if !matches!(view, View::Loading { .. }) {
            return view;
        }
        tokio::time::sleep(SETTLE_POLL).await;
    }
}
