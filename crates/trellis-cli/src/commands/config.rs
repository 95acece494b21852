use std::io::Write;

use anyhow::Context as _;
use serde_json::Value;
use trellis_ui_common::ConfigOverlay;

use super::CommandContext;
use crate::cli::ConfigCommands;

pub fn handle<W: Write>(ctx: &CommandContext, command: ConfigCommands, out: &mut W) -> anyhow::Result<()> {
    let storage = ctx.storage.as_ref();
    match command {
        ConfigCommands::Show => {}
        ConfigCommands::Set { json } => {
            let overrides: Value =
                serde_json::from_str(&json).context("overrides must be valid JSON")?;
            if !overrides.is_object() {
                anyhow::bail!("overrides must be a JSON object");
            }
            ConfigOverlay::save_overrides(storage, &overrides)?;
            tracing::info!("configuration overrides saved");
        }
        ConfigCommands::Reset => {
            ConfigOverlay::clear_overrides(storage)?;
            tracing::info!("configuration overrides cleared");
        }
    }

    let snapshot = ConfigOverlay::load_from(storage).snapshot();
    writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
    Ok(())
}
