//! Graph engine capability.
//!
//! Trellis never implements storage or query evaluation itself. An engine is
//! anything that can load serialized graph data, answer read queries with
//! variable bindings, and apply write requests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::term::Binding;

/// A graph store engine.
///
/// Errors are reported as `anyhow::Error` and travel to the caller unchanged.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Parse `content` (serialized as `format`, a media type such as
    /// `text/turtle`) and add it to the store. `base_iri` resolves relative
    /// references.
    async fn load(&self, content: &str, format: &str, base_iri: Option<&str>)
        -> anyhow::Result<()>;

    /// Evaluate a read query.
    async fn query(&self, text: &str) -> anyhow::Result<Vec<Binding>>;

    /// Apply a write request.
    async fn update(&self, text: &str) -> anyhow::Result<()>;
}

/// Creates a fresh engine instance for a store bootstrap.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(&self) -> anyhow::Result<Arc<dyn GraphEngine>>;
}

#[async_trait]
impl<F> EngineFactory for F
where
    F: Fn() -> anyhow::Result<Arc<dyn GraphEngine>> + Send + Sync,
{
    async fn create(&self) -> anyhow::Result<Arc<dyn GraphEngine>> {
        (self)()
    }
}
