//! Config persistence, path resolution and validation for `Config`.
//!
//! Covers:
//! - `load` / `save` (YAML file I/O with atomic write)
//! - XDG-style path helpers (`config_path`, `config_dir`, `default_store_path`)
//! - Store path resolution (`effective_store_path`)
//! - Field validation (`validate`)

use super::config_struct::Config;
use crate::defaults::{APP_DIR, CONFIG_FILE, STORE_FILE};
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, creating a default file if missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Config path: {:?}", path);

        if !path.exists() {
            log::info!("Config file not found, creating default at {:?}", path);
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                log::error!("Failed to save default config: {}", e);
                return Err(e);
            }
            log::info!("Default config created successfully");
            return Ok(config);
        }

        log::info!("Loading existing config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            log::warn!("Config file {:?} is empty, using defaults", path);
            return Ok(Self::default());
        }

        let config: Config = serde_yaml_ng::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::Serialize)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Get the configuration directory path (`~/.config/canopy`)
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("."))
        }
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir()
                .map(|home| home.join(".config").join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Default snapshot store location
    pub fn default_store_path() -> PathBuf {
        Self::config_dir().join(STORE_FILE)
    }

    /// Snapshot store location, honouring `store_path`
    pub fn effective_store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(Self::default_store_path)
    }

    /// Check field values that serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store_path) = &self.store_path {
            if store_path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "store_path must not be empty".to_string(),
                ));
            }
            if store_path.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "store_path '{}' is a directory, expected a file",
                    store_path.display()
                )));
            }
        }
        Ok(())
    }
}
