//! Configuration handling
//!
//! Configuration is read from `config.toml` inside the data directory when
//! one is given explicitly (`--dir` / `TODO_DIR`), otherwise from the global
//! `~/.config/todo-cli/config.toml`. Every field is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::item_store::DEFAULT_STORAGE_KEY;
use crate::domain::Filter;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Could not determine a data directory; pass --dir or set TODO_DIR")]
    NoDataDir,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted item list
    pub data_dir: Option<PathBuf>,

    /// Key the item list is stored under (file `{key}.json`)
    pub storage_key: String,

    /// Filter used when none is given
    pub default_filter: Filter,

    /// Output format used when `--format` is not given
    pub default_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_filter: Filter::All,
            default_format: OutputFormat::Text,
        }
    }
}

impl Config {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "todo", "todo-cli")
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the platform data directory
    pub fn default_data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Loads configuration, letting an explicit data directory take precedence
    pub fn load(dir_override: Option<&Path>) -> Result<Self> {
        let local = dir_override
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|path| path.is_file());
        let global = Self::global_config_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|path| path.is_file());

        let mut config = match local.or(global) {
            Some(path) => Self::load_file(&path)?,
            None => Self::default(),
        };

        if let Some(dir) = dir_override {
            config.data_dir = Some(dir.to_path_buf());
        }

        Ok(config)
    }

    /// Loads configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Returns the data directory to store items in
    pub fn resolved_data_dir(&self) -> Result<PathBuf, ConfigError> {
        self.data_dir
            .clone()
            .or_else(Self::default_data_dir)
            .ok_or(ConfigError::NoDataDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();

        assert_eq!(config.storage_key, "todo-list");
        assert_eq!(config.default_filter, Filter::All);
        assert_eq!(config.default_format, OutputFormat::Text);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
default_filter = "active"
storage_key = "groceries"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.default_filter, Filter::Active);
        assert_eq!(config.storage_key, "groceries");
        assert_eq!(config.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_rejects_unknown_filter() {
        let result: Result<Config, _> = toml::from_str(r#"default_filter = "done""#);
        assert!(result.is_err());
    }

    #[test]
    fn local_config_wins_and_dir_override_applies() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "default_format = \"json\"\ndata_dir = \"/somewhere/else\"\n",
        )
        .unwrap();

        let config = Config::load(Some(dir.path())).unwrap();

        assert_eq!(config.default_format, OutputFormat::Json);
        assert_eq!(config.data_dir.as_deref(), Some(dir.path()));
        assert_eq!(config.resolved_data_dir().unwrap(), dir.path());
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "storage_key = [").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }
}
