//! Text fetching for datasets and query documents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{CoreError, CoreResult};

/// Options forwarded untouched to the fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ask caching fetchers to go to the source.
    pub bypass_cache: bool,
}

/// Fetches a document as UTF-8 text.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn fetch_text(&self, path: &str, options: &FetchOptions) -> CoreResult<String>;
}

/// Reads documents from the filesystem, relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches("./"))
    }
}

#[async_trait]
impl TextFetcher for FsFetcher {
    async fn fetch_text(&self, path: &str, _options: &FetchOptions) -> CoreResult<String> {
        let full = self.resolve(path);
        tracing::trace!(path, resolved = %full.display(), "fetching document");
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| CoreError::io(path, e))
    }
}

/// Serves documents from memory. Useful for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fetcher = Self::new();
        for (path, content) in documents {
            fetcher.insert(path, content);
        }
        fetcher
    }

    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        self.documents.write().insert(path.into(), content.into());
    }

    pub fn remove(&self, path: &str) -> Option<String> {
        self.documents.write().remove(path)
    }
}

#[async_trait]
impl TextFetcher for MemoryFetcher {
    async fn fetch_text(&self, path: &str, _options: &FetchOptions) -> CoreResult<String> {
        self.documents
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                path: path.to_string(),
            })
    }
}
