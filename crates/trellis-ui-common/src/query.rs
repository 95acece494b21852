//! Query dispatch.
//!
//! [`QueryService`] classifies a query document, sends it to the store's read
//! or write entry point and flattens the engine's bindings into display rows.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use trellis_core::{classify_query, render_term, Binding, FetchOptions, QueryKind, TextFetcher};

use crate::error::{Error, Result};
use crate::store::{GraphStore, StoreContext};

/// One result row: variable name to display string, in engine order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn from_binding(binding: &Binding) -> Self {
        Self {
            cells: binding
                .iter()
                .map(|(name, term)| (name.to_string(), render_term(term)))
                .collect(),
        }
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// What a query produced. Rows exist only for reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Update,
    Rows(Vec<Row>),
}

/// Outcome of one query run.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Document path, or a caller-supplied label for inline text.
    pub source: String,
    pub query_text: String,
    pub elapsed: Duration,
    pub outcome: QueryOutcome,
}

impl QueryResult {
    pub fn kind(&self) -> QueryKind {
        match self.outcome {
            QueryOutcome::Update => QueryKind::Update,
            QueryOutcome::Rows(_) => QueryKind::Rows,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match &self.outcome {
            QueryOutcome::Rows(rows) => Some(rows),
            QueryOutcome::Update => None,
        }
    }

    pub fn row_count(&self) -> Option<usize> {
        self.rows().map(<[Row]>::len)
    }

    /// Variable names across all rows, in order of first appearance.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in self.rows().unwrap_or_default() {
            for (name, _) in row.iter() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        columns
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut value = json!({
            "kind": self.kind(),
            "source": self.source,
            "queryText": self.query_text,
            "elapsedMs": self.elapsed_ms(),
        });
        if let (Some(rows), Some(object)) = (self.rows(), value.as_object_mut()) {
            object.insert("rows".to_string(), json!(rows));
        }
        value
    }
}

/// Runs query documents against the bootstrapped store.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<GraphStore>,
    fetcher: Arc<dyn TextFetcher>,
}

impl QueryService {
    pub fn new(store: Arc<GraphStore>, fetcher: Arc<dyn TextFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Service over the context's store; fails if it is not bootstrapped yet.
    pub fn from_context(context: &StoreContext, fetcher: Arc<dyn TextFetcher>) -> Result<Self> {
        Ok(Self::new(context.get_store()?, fetcher))
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Classify and execute `text`. Engine errors are returned unchanged.
    pub async fn run_text(&self, text: &str, source: &str) -> Result<QueryResult> {
        let kind = classify_query(text);
        let started = Instant::now();

        let outcome = match kind {
            QueryKind::Update => {
                self.store.update(text).await?;
                QueryOutcome::Update
            }
            QueryKind::Rows => {
                let bindings = self.store.query(text).await?;
                QueryOutcome::Rows(bindings.iter().map(Row::from_binding).collect())
            }
        };

        let result = QueryResult {
            source: source.to_string(),
            query_text: text.to_string(),
            elapsed: started.elapsed(),
            outcome,
        };
        tracing::debug!(
            source,
            %kind,
            elapsed_ms = result.elapsed_ms(),
            rows = ?result.row_count(),
            "query finished"
        );
        Ok(result)
    }

    /// Fetch the document at `path` and run it with `source = path`.
    pub async fn run_path(&self, path: &str, options: &FetchOptions) -> Result<QueryResult> {
        let text = self
            .fetcher
            .fetch_text(path, options)
            .await
            .map_err(|source| Error::Fetch {
                path: path.to_string(),
                source,
            })?;
        self.run_text(&text, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEngine;
    use trellis_core::{MemoryFetcher, Term};

    async fn service(engine: &Arc<ScriptedEngine>, fetcher: Arc<MemoryFetcher>) -> QueryService {
        let context = StoreContext::new(
            engine.factory(),
            fetcher.clone(),
            "text/turtle",
            Default::default(),
        );
        let store = context.init_store().await.unwrap();
        QueryService::new(store, fetcher)
    }

    #[tokio::test]
    async fn read_queries_produce_display_rows() {
        let engine = ScriptedEngine::new().respond(
            "SELECT",
            vec![Binding::from_pairs([
                ("s", Term::named("urn:a#x")),
                ("label", Term::lang_literal("X", "en")),
            ])],
        );
        let service = service(&engine, Arc::new(MemoryFetcher::new())).await;

        let result = service
            .run_text("PREFIX a: <urn:a#>\nSELECT ?s ?label WHERE { ?s a:label ?label }", "inline")
            .await
            .unwrap();

        assert_eq!(result.kind(), QueryKind::Rows);
        let rows = result.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("s"), Some("urn:a#x"));
        assert_eq!(rows[0].get("label"), Some("\"X\"@en"));
        assert_eq!(result.columns(), vec!["s", "label"]);
        assert!(result.elapsed_ms() >= 0.0);
        assert!(engine.updates().is_empty());
    }

    #[tokio::test]
    async fn write_queries_go_through_update() {
        let engine = ScriptedEngine::new();
        let service = service(&engine, Arc::new(MemoryFetcher::new())).await;

        let text = "# add one\nINSERT DATA { <urn:a#x> <urn:a#p> 1 }";
        let result = service.run_text(text, "editor").await.unwrap();

        assert_eq!(result.kind(), QueryKind::Update);
        assert!(result.rows().is_none());
        assert_eq!(engine.updates(), vec![text.to_string()]);
        assert!(result.to_json().get("rows").is_none());
    }

    #[tokio::test]
    async fn run_path_uses_path_as_source() {
        let engine = ScriptedEngine::new();
        let fetcher = Arc::new(MemoryFetcher::new());
        fetcher.insert("queries/nodes.rq", "SELECT ?s WHERE { ?s ?p ?o }");
        let service = service(&engine, fetcher).await;

        let result = service
            .run_path("queries/nodes.rq", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.source, "queries/nodes.rq");
        assert_eq!(result.to_json()["kind"], "rows");
        assert_eq!(result.to_json()["rows"], json!([]));

        let err = service
            .run_path("queries/missing.rq", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { path, .. } if path == "queries/missing.rq"));
    }

    #[tokio::test]
    async fn engine_errors_propagate_unchanged() {
        let engine = ScriptedEngine::new().fail_queries_containing("BROKEN");
        let service = service(&engine, Arc::new(MemoryFetcher::new())).await;

        let err = service.run_text("SELECT BROKEN", "inline").await.unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert!(err.to_string().contains("BROKEN"));
    }

    #[test]
    fn from_context_requires_initialized_store() {
        let engine = ScriptedEngine::new();
        let fetcher = Arc::new(MemoryFetcher::new());
        let context =
            StoreContext::new(engine.factory(), fetcher.clone(), "text/turtle", Default::default());
        assert!(matches!(
            QueryService::from_context(&context, fetcher),
            Err(Error::NotInitialized)
        ));
    }
}
