//! Configuration loaded from `config.toml`, with `.env` / environment overrides.

use crate::error::ConfigError;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tasklist";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the initial task list comes from: an http(s) URL or a file path.
    pub bootstrap: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub priorities: Vec<String>,
    pub default_priority: String,
    /// `chrono` format string for the creation date of new tasks.
    pub date_format: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bootstrap: Some("tasks.json".to_string()),
            data_dir: None,
            priorities: vec!["High".into(), "Medium".into(), "Low".into()],
            default_priority: "Medium".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads the config file (if any), then applies `TASKLIST_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var("TASKLIST_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("tasklist.log")
    }

    fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bootstrap) = var("TASKLIST_BOOTSTRAP") {
            // An empty value disables the bootstrap fetch.
            self.bootstrap = if bootstrap.trim().is_empty() {
                None
            } else {
                Some(bootstrap)
            };
        }
        if let Some(dir) = var("TASKLIST_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.priorities.is_empty() {
            return Err(ConfigError::Invalid("at least one priority is required".into()));
        }
        if !self.priorities.contains(&self.default_priority) {
            return Err(ConfigError::Invalid(format!(
                "default priority `{}` is not one of {:?}",
                self.default_priority, self.priorities
            )));
        }
        if StrftimeItems::new(&self.date_format).any(|item| item == Item::Error) {
            return Err(ConfigError::Invalid(format!(
                "date format `{}` is not a valid strftime pattern",
                self.date_format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "date_format = \"%Y-%m-%d\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.date_format, "%Y-%m-%d");
        assert_eq!(config.priorities, vec!["High", "Medium", "Low"]);
        assert_eq!(config.bootstrap.as_deref(), Some("tasks.json"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "priorities = 3").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TASKLIST_BOOTSTRAP", "https://example.org/tasks.json"),
            ("TASKLIST_DATA_DIR", "/tmp/tasklist-data"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.bootstrap.as_deref(),
            Some("https://example.org/tasks.json")
        );
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/tasklist-data"));
    }

    #[test]
    fn test_empty_bootstrap_override_disables_fetch() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "TASKLIST_BOOTSTRAP").then(String::new));
        assert_eq!(config.bootstrap, None);
    }

    #[test]
    fn test_default_priority_must_be_listed() {
        let config = Config {
            default_priority: "Urgent".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            priorities: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            date_format: "%Q".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}
