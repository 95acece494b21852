/// Application configuration for the `trellis` binary
///
/// Separate from the runtime overlay kept in storage: this only says where
/// data and storage live and how to log. Sources, later ones winning:
/// built-in defaults, `./trellis.toml`, `<config dir>/trellis/config.toml`,
/// then `TRELLIS_*` environment variables (`TRELLIS_DATA__ROOT=site`).
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory datasets and query documents are read from.
    #[serde(default = "default_data_root")]
    pub root: String,
    /// JSON file holding persisted overrides and preferences. Defaults to
    /// `<config dir>/trellis/storage.json`.
    #[serde(default)]
    pub storage_file: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_data_root() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_data_root(),
            storage_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data.root)
    }

    /// Storage file to use, if one can be determined.
    pub fn storage_path(&self) -> Option<PathBuf> {
        match &self.data.storage_file {
            Some(file) => Some(PathBuf::from(file)),
            None => trellis_core::JsonFileStorage::default_path(),
        }
    }
}

/// Loads [`AppConfig`] from its layered sources.
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    /// Load from the default search locations and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("trellis").required(false));
        if let Some(path) = Self::default_config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize::<AppConfig>()?;

        Ok(ConfigManager { config })
    }

    /// Load from one specific file, still honoring the environment.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?
            .try_deserialize::<AppConfig>()?;

        Ok(ConfigManager { config })
    }

    /// `<config dir>/trellis/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trellis").join("config.toml"))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(&self.config)?)?;
        Ok(())
    }

    fn environment() -> Environment {
        Environment::with_prefix("TRELLIS")
            .prefix_separator("_")
            .separator("__")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_read_from_working_directory() {
        let config = AppConfig::default();
        assert_eq!(config.data.root, ".");
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(
            &path,
            "[data]\nroot = \"site\"\nstorage_file = \"state.json\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = ConfigManager::load_from_file(&path).unwrap().into_config();
        assert_eq!(config.data_root(), PathBuf::from("site"));
        assert_eq!(config.storage_path(), Some(PathBuf::from("state.json")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(&path, "[logging]\nlog_dir = \"logs\"\n").unwrap();

        let config = ConfigManager::load_from_file(&path).unwrap().into_config();
        assert_eq!(config.data.root, ".");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.log_dir.as_deref(), Some("logs"));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut manager = ConfigManager::default();
        manager.config_mut().data.root = "elsewhere".into();
        manager.save_to_file(&path).unwrap();

        let loaded = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(loaded.config().data.root, "elsewhere");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigManager::load_from_file(dir.path().join("absent.toml")).is_err());
    }
}
