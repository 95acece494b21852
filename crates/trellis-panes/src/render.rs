//! Shared asynchronous render path for panes that run queries.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use trellis_core::FetchOptions;
use trellis_ui_common::{
    spawn_render, PaneContext, QueryCompleted, QueryInput, QueryOutcome, QueryResult,
    RenderGuard, RenderTicket, Result, StoreAction, StoreChanged, Surface, View,
};

/// Source label for queries submitted as text.
pub const INLINE_SOURCE: &str = "inline";

/// Runs queries for one pane and paints their results.
///
/// Renders are never cancelled; a result is painted only if no newer render
/// started meanwhile. Writes are announced on the bus even when their result
/// is no longer painted.
#[derive(Clone)]
pub struct QueryRenderer {
    pane: String,
    ctx: PaneContext,
    surface: Arc<Surface>,
    guard: RenderGuard,
    last: Arc<Mutex<Option<QueryInput>>>,
    default: Option<QueryInput>,
}

impl QueryRenderer {
    pub fn new(
        pane: impl Into<String>,
        ctx: PaneContext,
        surface: Arc<Surface>,
        guard: RenderGuard,
        default: Option<QueryInput>,
    ) -> Self {
        Self {
            pane: pane.into(),
            ctx,
            surface,
            guard,
            last: Arc::new(Mutex::new(None)),
            default,
        }
    }

    /// Start rendering `input`, superseding any render in flight.
    pub fn render(&self, input: QueryInput) -> Option<JoinHandle<()>> {
        *self.last.lock() = Some(input.clone());
        let ticket = self.guard.begin();
        self.surface.paint(View::loading(label(&input)));

        let this = self.clone();
        spawn_render(async move { this.run(input, ticket).await })
    }

    /// Render the last input again, or the default when nothing ran yet.
    pub fn rerender(&self) -> Option<JoinHandle<()>> {
        let input = self.last.lock().clone().or_else(|| self.default.clone())?;
        self.render(input)
    }

    pub fn last_input(&self) -> Option<QueryInput> {
        self.last.lock().clone()
    }

    async fn execute(&self, input: &QueryInput) -> Result<QueryResult> {
        let service = self.ctx.query_service().await?;
        match input {
            QueryInput::Path(path) => service.run_path(path, &FetchOptions::default()).await,
            QueryInput::Text(text) => service.run_text(text, INLINE_SOURCE).await,
        }
    }

    async fn run(self, input: QueryInput, ticket: RenderTicket) {
        let outcome = self.execute(&input).await;
        let current = self.guard.is_current(ticket);

        match outcome {
            Ok(result) => {
                if current {
                    self.surface.paint(result_view(&result));
                } else {
                    tracing::debug!(pane = %self.pane, source = %result.source, "discarding stale render");
                }

                if matches!(result.outcome, QueryOutcome::Update) {
                    self.ctx.bus.emit(StoreChanged {
                        source: self.pane.clone(),
                        action: StoreAction::Update,
                    });
                }

                if current {
                    self.ctx.bus.emit(QueryCompleted {
                        pane: self.pane.clone(),
                        source: result.source.clone(),
                        kind: result.kind(),
                        elapsed_ms: result.elapsed_ms(),
                        row_count: result.row_count(),
                    });
                }
            }
            Err(e) => {
                tracing::warn!(pane = %self.pane, query = %label(&input), error = %e, "query failed");
                if current {
                    self.surface.paint(View::error(label(&input), e.to_string()));
                }
            }
        }
    }
}

fn label(input: &QueryInput) -> String {
    match input {
        QueryInput::Path(path) => path.clone(),
        QueryInput::Text(_) => INLINE_SOURCE.to_string(),
    }
}

/// View model for a finished query.
pub fn result_view(result: &QueryResult) -> View {
    match &result.outcome {
        QueryOutcome::Update => View::message(format!(
            "{}: update applied in {:.1} ms",
            result.source,
            result.elapsed_ms()
        )),
        QueryOutcome::Rows(rows) => {
            let columns = result.columns();
            let cells = rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|column| row.get(column).unwrap_or_default().to_string())
                        .collect()
                })
                .collect();
            View::Table {
                caption: format!(
                    "{}: {} rows in {:.1} ms",
                    result.source,
                    rows.len(),
                    result.elapsed_ms()
                ),
                columns,
                rows: cells,
            }
        }
    }
}
