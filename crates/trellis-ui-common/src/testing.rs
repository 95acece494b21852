//! Scripted graph engine for tests and demos.
//!
//! [`ScriptedEngine`] understands a tiny line-based dataset format instead of
//! a real serialization:
//!
//! - `define NAME` declares an entity;
//! - `use NAME` fails unless an earlier load declared `NAME`;
//! - `fail` is a syntax error;
//! - anything else is accepted and ignored.
//!
//! Queries answer with canned bindings chosen by substring, optionally after a
//! delay, and every call is recorded for assertions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;
use trellis_core::{Binding, EngineFactory, GraphEngine};

#[derive(Default)]
pub struct ScriptedEngine {
    defined: Mutex<HashSet<String>>,
    loads: Mutex<Vec<Load>>,
    queries: Mutex<Vec<String>>,
    updates: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, Vec<Binding>)>>,
    delays: Mutex<Vec<(String, Duration)>>,
    failing: Mutex<Vec<String>>,
    load_delay: Mutex<Duration>,
    creates: AtomicUsize,
}

/// A recorded `load` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    pub content: String,
    pub format: String,
    pub base_iri: Option<String>,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer queries containing `needle` with `rows`. First match wins.
    pub fn respond(self: Arc<Self>, needle: &str, rows: Vec<Binding>) -> Arc<Self> {
        self.responses.lock().push((needle.to_string(), rows));
        self
    }

    /// Delay queries containing `needle`.
    pub fn delay(self: Arc<Self>, needle: &str, delay: Duration) -> Arc<Self> {
        self.delays.lock().push((needle.to_string(), delay));
        self
    }

    /// Delay every load.
    pub fn load_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.load_delay.lock() = delay;
        self
    }

    /// Fail queries and updates containing `needle`.
    pub fn fail_queries_containing(self: Arc<Self>, needle: &str) -> Arc<Self> {
        self.failing.lock().push(needle.to_string());
        self
    }

    /// Factory handing out this engine. Counts [`creates`](Self::creates).
    pub fn factory(self: &Arc<Self>) -> Arc<dyn EngineFactory> {
        let this = Arc::clone(self);
        Arc::new(move || {
            this.creates.fetch_add(1, Ordering::SeqCst);
            let engine: Arc<dyn GraphEngine> = this.clone();
            Ok::<_, anyhow::Error>(engine)
        })
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> Vec<Load> {
        self.loads.lock().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().clone()
    }

    fn check_failing(&self, text: &str) -> anyhow::Result<()> {
        if let Some(needle) = self.failing.lock().iter().find(|n| text.contains(n.as_str())) {
            bail!("engine rejected request containing {needle}");
        }
        Ok(())
    }

    fn delay_for(&self, text: &str) -> Option<Duration> {
        self.delays
            .lock()
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, delay)| *delay)
    }
}

#[async_trait]
impl GraphEngine for ScriptedEngine {
    async fn load(&self, content: &str, format: &str, base_iri: Option<&str>) -> anyhow::Result<()> {
        self.loads.lock().push(Load {
            content: content.to_string(),
            format: format.to_string(),
            base_iri: base_iri.map(str::to_string),
        });

        let delay = *self.load_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut declared = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line == "fail" {
                bail!("syntax error at line {}", number + 1);
            }
            if let Some(name) = line.strip_prefix("define ") {
                declared.push(name.trim().to_string());
            } else if let Some(name) = line.strip_prefix("use ") {
                let name = name.trim();
                if !self.defined.lock().contains(name) && !declared.iter().any(|d| d == name) {
                    bail!("undefined reference {name} at line {}", number + 1);
                }
            }
        }

        self.defined.lock().extend(declared);
        Ok(())
    }

    async fn query(&self, text: &str) -> anyhow::Result<Vec<Binding>> {
        self.queries.lock().push(text.to_string());
        if let Some(delay) = self.delay_for(text) {
            tokio::time::sleep(delay).await;
        }
        self.check_failing(text)?;

        let rows = self
            .responses
            .lock()
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Ok(rows)
    }

    async fn update(&self, text: &str) -> anyhow::Result<()> {
        if let Some(delay) = self.delay_for(text) {
            tokio::time::sleep(delay).await;
        }
        self.check_failing(text)?;
        self.updates.lock().push(text.to_string());
        Ok(())
    }
}
