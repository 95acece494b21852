//! Runtime configuration overlay.
//!
//! Compiled-in defaults for base identifiers, document paths, the dataset mime
//! type and the ordered dataset list, with a persisted JSON overlay applied on
//! top. Overrides must be applied before the store is bootstrapped; the
//! dataset list is shared with the [`StoreContext`](crate::store::StoreContext)
//! through [`ConfigOverlay::shared_datasets`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trellis_core::KvStorage;

use crate::error::Result;

/// Storage key holding the persisted overrides.
pub const OVERRIDES_KEY: &str = "trellis.config.overrides";

/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "trellis.theme";

/// Mime type used to load datasets unless overridden.
pub const DEFAULT_MIME_TYPE: &str = "text/turtle";

/// Datasets derived from paths and bases, in load order: (path, base name).
const DATASET_PLAN: &[(&[&str], &str)] = &[
    (&["data", "ontology"], "ontology"),
    (&["data", "instances"], "data"),
];

/// A node of the path tree: either a document path or a nested group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathNode {
    Leaf(String),
    Branch(PathTree),
}

pub type PathTree = BTreeMap<String, PathNode>;

/// One graph document and the base identifier for its relative references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub path: String,
    #[serde(default)]
    pub base: String,
}

impl Dataset {
    pub fn new(path: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
        }
    }

    /// Base identifier, or `None` when empty.
    pub fn base_iri(&self) -> Option<&str> {
        if self.base.is_empty() {
            None
        } else {
            Some(self.base.as_str())
        }
    }
}

/// Serializable view of the effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub mime_type: String,
    pub bases: BTreeMap<String, String>,
    pub paths: PathTree,
    pub datasets: Vec<Dataset>,
}

/// Whether [`ConfigOverlay::apply_overrides`] found an overrides object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    Applied,
    NotApplied,
}

/// Effective runtime configuration.
#[derive(Debug)]
pub struct ConfigOverlay {
    mime_type: String,
    bases: BTreeMap<String, String>,
    paths: PathTree,
    datasets: Arc<RwLock<Vec<Dataset>>>,
}

impl Default for ConfigOverlay {
    fn default() -> Self {
        let bases = BTreeMap::from([
            ("ontology".to_string(), "urn:trellis:ontology#".to_string()),
            ("data".to_string(), "urn:trellis:data#".to_string()),
        ]);

        let paths = PathTree::from([
            (
                "data".to_string(),
                branch(&[
                    ("ontology", "data/ontology.ttl"),
                    ("instances", "data/instances.ttl"),
                ]),
            ),
            (
                "q".to_string(),
                branch(&[
                    ("nodes", "queries/nodes.rq"),
                    ("edges", "queries/edges.rq"),
                    ("classes", "queries/classes.rq"),
                ]),
            ),
        ]);

        let mut overlay = Self {
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            bases,
            paths,
            datasets: Arc::new(RwLock::new(Vec::new())),
        };
        overlay.rebuild_datasets();
        overlay
    }
}

fn branch(leaves: &[(&str, &str)]) -> PathNode {
    PathNode::Branch(
        leaves
            .iter()
            .map(|(k, v)| (k.to_string(), PathNode::Leaf(v.to_string())))
            .collect(),
    )
}

impl ConfigOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the persisted overrides from `storage` applied.
    pub fn load_from(storage: &dyn KvStorage) -> Self {
        let mut overlay = Self::default();
        overlay.apply_persisted(storage);
        overlay
    }

    /// Apply an overrides document.
    ///
    /// Anything other than a JSON object is treated as "no overrides" and
    /// only re-derives the dataset list. Invalid entries are skipped, never
    /// reported.
    pub fn apply_overrides(&mut self, overrides: Option<&Value>) -> OverlayOutcome {
        let Some(Value::Object(map)) = overrides else {
            self.rebuild_datasets();
            return OverlayOutcome::NotApplied;
        };

        if let Some(Value::Object(bases)) = map.get("bases") {
            for (name, value) in bases {
                match (self.bases.get_mut(name), value) {
                    (Some(slot), Value::String(s)) => *slot = s.clone(),
                    _ => tracing::debug!(base = %name, "ignoring base override"),
                }
            }
        }

        if let Some(Value::Object(paths)) = map.get("paths") {
            merge_paths(&mut self.paths, paths, "");
        }

        match map.get("datasets") {
            Some(Value::Array(items)) => {
                let datasets = items.iter().filter_map(dataset_from_value).collect();
                self.replace_datasets(datasets);
            }
            _ => self.rebuild_datasets(),
        }

        OverlayOutcome::Applied
    }

    /// Read and apply the overrides persisted in `storage`.
    ///
    /// Unreadable or malformed entries are logged and treated as absent. When
    /// nothing usable is persisted the overlay is left untouched, including a
    /// dataset list set by earlier overrides.
    pub fn apply_persisted(&mut self, storage: &dyn KvStorage) -> OverlayOutcome {
        let raw = match storage.get(OVERRIDES_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "could not read config overrides");
                None
            }
        };

        let parsed = raw.and_then(|raw| match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed config overrides");
                None
            }
        });

        match parsed {
            Some(overrides) => self.apply_overrides(Some(&overrides)),
            None => OverlayOutcome::NotApplied,
        }
    }

    /// Persist an overrides document for the next start.
    pub fn save_overrides(storage: &dyn KvStorage, overrides: &Value) -> Result<()> {
        let raw = serde_json::to_string(overrides)?;
        storage.set(OVERRIDES_KEY, &raw)?;
        Ok(())
    }

    /// Forget the persisted overrides.
    pub fn clear_overrides(storage: &dyn KvStorage) -> Result<()> {
        storage.remove(OVERRIDES_KEY)?;
        Ok(())
    }

    /// Look up a document path by its segments, e.g. `["q", "nodes"]`.
    pub fn path(&self, segments: &[&str]) -> Option<&str> {
        let (last, parents) = segments.split_last()?;
        let mut tree = &self.paths;
        for segment in parents {
            match tree.get(*segment)? {
                PathNode::Branch(sub) => tree = sub,
                PathNode::Leaf(_) => return None,
            }
        }
        match tree.get(*last)? {
            PathNode::Leaf(path) => Some(path.as_str()),
            PathNode::Branch(_) => None,
        }
    }

    /// Look up a document path by dotted key, e.g. `"q.nodes"`.
    pub fn path_str(&self, key: &str) -> Option<&str> {
        let segments: Vec<&str> = key.split('.').collect();
        self.path(&segments)
    }

    pub fn base(&self, name: &str) -> Option<&str> {
        self.bases.get(name).map(String::as_str)
    }

    pub fn bases(&self) -> &BTreeMap<String, String> {
        &self.bases
    }

    pub fn paths(&self) -> &PathTree {
        &self.paths
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Current dataset list, in load order.
    pub fn datasets(&self) -> Vec<Dataset> {
        self.datasets.read().clone()
    }

    /// Handle on the working dataset list. Overrides update it in place.
    pub fn shared_datasets(&self) -> Arc<RwLock<Vec<Dataset>>> {
        Arc::clone(&self.datasets)
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            mime_type: self.mime_type.clone(),
            bases: self.bases.clone(),
            paths: self.paths.clone(),
            datasets: self.datasets(),
        }
    }

    fn rebuild_datasets(&mut self) {
        let derived = DATASET_PLAN
            .iter()
            .filter_map(|(segments, base)| {
                let path = self.path(segments)?;
                Some(Dataset::new(path, self.base(base).unwrap_or_default()))
            })
            .collect();
        self.replace_datasets(derived);
    }

    fn replace_datasets(&mut self, datasets: Vec<Dataset>) {
        let mut slot = self.datasets.write();
        slot.clear();
        slot.extend(datasets);
    }
}

fn merge_paths(tree: &mut PathTree, overrides: &Map<String, Value>, prefix: &str) {
    for (key, value) in overrides {
        match tree.get_mut(key) {
            Some(node) => match (node, value) {
                (PathNode::Leaf(slot), Value::String(s)) => *slot = s.clone(),
                (PathNode::Branch(sub), Value::Object(nested)) => {
                    merge_paths(sub, nested, &format!("{prefix}{key}."))
                }
                _ => tracing::debug!(key = %format!("{prefix}{key}"), "ignoring path override"),
            },
            None => match value {
                Value::String(s) => {
                    tree.insert(key.clone(), PathNode::Leaf(s.clone()));
                }
                Value::Object(nested) => {
                    let mut sub = PathTree::new();
                    merge_paths(&mut sub, nested, &format!("{prefix}{key}."));
                    if !sub.is_empty() {
                        tree.insert(key.clone(), PathNode::Branch(sub));
                    }
                }
                _ => tracing::debug!(key = %format!("{prefix}{key}"), "ignoring path override"),
            },
        }
    }
}

fn dataset_from_value(value: &Value) -> Option<Dataset> {
    let path = value.get("path")?.as_str()?;
    let base = value.get("base").and_then(Value::as_str).unwrap_or_default();
    Some(Dataset::new(path, base))
}

/// Color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    /// Parse a stored value; unknown values fall back to [`Theme::System`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            _ => Theme::System,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn load(storage: &dyn KvStorage) -> Self {
        match storage.get(THEME_KEY) {
            Ok(Some(value)) => Self::parse(&value),
            Ok(None) => Theme::System,
            Err(e) => {
                tracing::warn!(error = %e, "could not read theme preference");
                Theme::System
            }
        }
    }

    pub fn save(&self, storage: &dyn KvStorage) -> Result<()> {
        storage.set(THEME_KEY, self.as_str())?;
        Ok(())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_core::MemoryStorage;

    #[test]
    fn defaults_derive_datasets_from_paths_and_bases() {
        let config = ConfigOverlay::new();
        assert_eq!(config.mime_type(), "text/turtle");
        assert_eq!(
            config.datasets(),
            vec![
                Dataset::new("data/ontology.ttl", "urn:trellis:ontology#"),
                Dataset::new("data/instances.ttl", "urn:trellis:data#"),
            ]
        );
        assert_eq!(config.path_str("q.nodes"), Some("queries/nodes.rq"));
    }

    #[test]
    fn path_override_changes_only_that_leaf() {
        let mut config = ConfigOverlay::new();
        let before = config.snapshot();

        let outcome =
            config.apply_overrides(Some(&json!({"paths": {"q": {"nodes": "custom.sparql"}}})));
        assert_eq!(outcome, OverlayOutcome::Applied);
        assert_eq!(config.path_str("q.nodes"), Some("custom.sparql"));

        let after = config.snapshot();
        assert_eq!(after.bases, before.bases);
        assert_eq!(after.datasets, before.datasets);
        assert_eq!(config.path_str("q.edges"), Some("queries/edges.rq"));
    }

    #[test]
    fn non_string_leaves_are_skipped() {
        let mut config = ConfigOverlay::new();
        config.apply_overrides(Some(&json!({
            "paths": {
                "q": {"nodes": 42, "edges": true, "classes": null},
                "data": {"ontology": {"nested": "x.ttl"}}
            }
        })));
        assert_eq!(config.path_str("q.nodes"), Some("queries/nodes.rq"));
        assert_eq!(config.path_str("q.edges"), Some("queries/edges.rq"));
        assert_eq!(config.path_str("q.classes"), Some("queries/classes.rq"));
        assert_eq!(config.path_str("data.ontology"), Some("data/ontology.ttl"));
    }

    #[test]
    fn string_over_branch_is_skipped_and_unknown_keys_added() {
        let mut config = ConfigOverlay::new();
        config.apply_overrides(Some(&json!({
            "paths": {"q": "flat.rq", "views": {"graph": "queries/graph.rq", "bad": 1}}
        })));
        assert_eq!(config.path_str("q.nodes"), Some("queries/nodes.rq"));
        assert_eq!(config.path_str("views.graph"), Some("queries/graph.rq"));
        assert_eq!(config.path_str("views.bad"), None);
    }

    #[test]
    fn base_overrides_rebuild_datasets() {
        let mut config = ConfigOverlay::new();
        config.apply_overrides(Some(&json!({
            "bases": {"data": "urn:custom#", "unknown": "urn:x#", "ontology": 7}
        })));
        assert_eq!(config.base("data"), Some("urn:custom#"));
        assert_eq!(config.base("ontology"), Some("urn:trellis:ontology#"));
        assert_eq!(config.base("unknown"), None);
        assert_eq!(config.datasets()[1], Dataset::new("data/instances.ttl", "urn:custom#"));
    }

    #[test]
    fn explicit_datasets_replace_list_in_place() {
        let mut config = ConfigOverlay::new();
        let shared = config.shared_datasets();

        config.apply_overrides(Some(&json!({
            "datasets": [
                {"path": "a.ttl", "base": "urn:a#"},
                {"path": "b.ttl"},
                {"base": "urn:nopath#"},
                {"path": 3}
            ]
        })));

        let expected = vec![Dataset::new("a.ttl", "urn:a#"), Dataset::new("b.ttl", "")];
        assert_eq!(config.datasets(), expected);
        assert_eq!(*shared.read(), expected);
        assert_eq!(expected[1].base_iri(), None);
    }

    #[test]
    fn non_object_overrides_are_not_applied() {
        let mut config = ConfigOverlay::new();
        assert_eq!(config.apply_overrides(None), OverlayOutcome::NotApplied);
        assert_eq!(
            config.apply_overrides(Some(&json!(["paths"]))),
            OverlayOutcome::NotApplied
        );
        assert_eq!(config.datasets().len(), 2);
    }

    #[test]
    fn persisted_overrides_roundtrip_through_storage() {
        let storage = MemoryStorage::new();
        ConfigOverlay::save_overrides(&storage, &json!({"paths": {"q": {"edges": "e.rq"}}}))
            .unwrap();

        let config = ConfigOverlay::load_from(&storage);
        assert_eq!(config.path_str("q.edges"), Some("e.rq"));

        ConfigOverlay::clear_overrides(&storage).unwrap();
        let config = ConfigOverlay::load_from(&storage);
        assert_eq!(config.path_str("q.edges"), Some("queries/edges.rq"));
    }

    #[test]
    fn malformed_persisted_overrides_are_ignored() {
        let storage = MemoryStorage::new();
        storage.set(OVERRIDES_KEY, "{not json").unwrap();

        let mut config = ConfigOverlay::new();
        assert_eq!(config.apply_persisted(&storage), OverlayOutcome::NotApplied);
        assert_eq!(config.snapshot(), ConfigOverlay::new().snapshot());
    }

    #[test]
    fn absent_persisted_overrides_keep_explicit_datasets() {
        let mut config = ConfigOverlay::new();
        config.apply_overrides(Some(&json!({"datasets": [{"path": "a.ttl", "base": "urn:a#"}]})));

        assert_eq!(
            config.apply_persisted(&MemoryStorage::new()),
            OverlayOutcome::NotApplied
        );
        assert_eq!(config.datasets(), vec![Dataset::new("a.ttl", "urn:a#")]);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let value = serde_json::to_value(ConfigOverlay::new().snapshot()).unwrap();
        assert_eq!(value["mimeType"], "text/turtle");
        assert_eq!(value["paths"]["q"]["nodes"], "queries/nodes.rq");
        assert_eq!(value["datasets"][0]["base"], "urn:trellis:ontology#");
    }

    #[test]
    fn theme_falls_back_to_system() {
        let storage = MemoryStorage::new();
        assert_eq!(Theme::load(&storage), Theme::System);

        Theme::Dark.save(&storage).unwrap();
        assert_eq!(Theme::load(&storage), Theme::Dark);

        storage.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(Theme::load(&storage), Theme::System);
    }
}
