use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::scroll::DEFAULT_PROXIMITY_THRESHOLD;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3001";
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const API_BASE_ENV: &str = "DOCCHAT_API_BASE";
pub const LOG_FILTER_ENV: &str = "DOCCHAT_LOG";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base: Option<String>,
    pub scroll_threshold: Option<u16>,
    pub log_filter: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Load the config, writing a starter file with the defaults when none
    /// exists yet so the user has something to edit.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::get_config_path()?)
    }

    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from(config_path);
        }

        let config = Self::starter();
        config.save_to(config_path)?;
        Ok(config)
    }

    /// Every field filled with its default
    pub fn starter() -> Self {
        Self {
            api_base: Some(DEFAULT_API_BASE.to_string()),
            scroll_threshold: Some(DEFAULT_PROXIMITY_THRESHOLD),
            log_filter: Some(DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Service base URL - environment first, then config file, then default
    pub fn api_base(&self) -> String {
        std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn log_filter(&self) -> String {
        std::env::var(LOG_FILTER_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.log_filter.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }

    pub fn scroll_threshold(&self) -> u16 {
        self.scroll_threshold.unwrap_or(DEFAULT_PROXIMITY_THRESHOLD)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("docchat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.scroll_threshold(), DEFAULT_PROXIMITY_THRESHOLD);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base: Some("http://localhost:9000".to_string()),
            scroll_threshold: Some(5),
            log_filter: Some("debug".to_string()),
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.scroll_threshold(), 5);
    }

    #[test]
    fn test_partial_file_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "scroll_threshold": 2 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.scroll_threshold(), 2);
        assert!(config.api_base.is_none());
    }

    #[test]
    fn test_first_run_writes_starter_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docchat").join("config.json");

        let config = Config::load_or_create_at(&path).unwrap();

        assert_eq!(config, Config::starter());
        assert_eq!(Config::load_from(&path).unwrap(), Config::starter());
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "api_base": "http://docs.internal:8080" }"#).unwrap();

        let config = Config::load_or_create_at(&path).unwrap();

        assert_eq!(config.api_base.as_deref(), Some("http://docs.internal:8080"));
        assert!(config.scroll_threshold.is_none());
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("docs.internal"));
        assert!(!on_disk.contains("scroll_threshold"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
