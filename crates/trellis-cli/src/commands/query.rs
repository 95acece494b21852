use std::io::Write;

use trellis_core::FetchOptions;
use trellis_panes::render::INLINE_SOURCE;

use super::CommandContext;
use crate::output::write_result;

pub async fn run_path<W: Write>(
    ctx: &CommandContext,
    path: &str,
    no_cache: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let service = ctx.service()?;
    let options = FetchOptions {
        bypass_cache: no_cache,
    };
    let result = service.queries().await?.run_path(path, &options).await?;
    tracing::info!(source = %result.source, kind = %result.kind(), rows = ?result.row_count(), "query finished");
    write_result(out, &result, ctx.json)?;
    Ok(())
}

pub async fn run_text<W: Write>(ctx: &CommandContext, text: &str, out: &mut W) -> anyhow::Result<()> {
    let service = ctx.service()?;
    let result = service.queries().await?.run_text(text, INLINE_SOURCE).await?;
    tracing::info!(kind = %result.kind(), rows = ?result.row_count(), "query finished");
    write_result(out, &result, ctx.json)?;
    Ok(())
}
