use std::io::Write;

use serde_json::json;
use trellis_ui_common::ConfigOverlay;

use super::CommandContext;
use crate::output::write_datasets;

/// List datasets in load order. With `load`, bootstrap the store first so
/// load failures surface here.
pub async fn handle<W: Write>(ctx: &CommandContext, load: bool, out: &mut W) -> anyhow::Result<()> {
    if !load {
        let datasets = ConfigOverlay::load_from(ctx.storage.as_ref()).datasets();
        if ctx.json {
            writeln!(out, "{}", json!({ "datasets": datasets }))?;
        } else {
            write_datasets(out, &datasets)?;
        }
        return Ok(());
    }

    let service = ctx.service()?;
    let store = service.init_store().await?;
    let loaded_at = store.loaded_at().to_rfc3339();
    if ctx.json {
        writeln!(
            out,
            "{}",
            json!({ "datasets": store.datasets(), "loadedAt": loaded_at })
        )?;
    } else {
        write_datasets(out, store.datasets())?;
        writeln!(out, "loaded at {loaded_at}")?;
    }
    Ok(())
}
