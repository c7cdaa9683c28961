//! Configuration Management
//!
//! This module handles the configuration file of Docsmith:
//! - Discovery in the working directory and the user's config locations
//! - Layered loading (defaults, file, environment)
//! - Reading and updating values by dotted key path

use docsmith_shared::{ConfigError, DocsmithConfig, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

pub const CONFIG_FILE_NAME: &str = "docsmith.toml";

/// Configuration manager for Docsmith
pub struct ConfigManager {
    /// Current configuration
    config: Arc<RwLock<DocsmithConfig>>,

    /// Configuration file path, when one was loaded or saved
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new(config: DocsmithConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            config_path: None,
        }
    }

    /// Load from `path`, or from the first discovered file, with
    /// environment overrides applied on top
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    }
                    .into());
                }
                Some(path.to_path_buf())
            }
            None => Self::discover(),
        };

        match &path {
            Some(path) => info!("Loading configuration from: {}", path.display()),
            None => debug!("No configuration file found, using defaults"),
        }

        let config = DocsmithConfig::load_layered(path.as_deref())?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: path,
        })
    }

    /// First existing file among the search paths
    pub fn discover() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.is_file())
    }

    /// Get configuration search paths, in order of preference
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".").join(CONFIG_FILE_NAME)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("docsmith").join(CONFIG_FILE_NAME));
        }
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".docsmith.toml"));
        }

        paths
    }

    /// Default location for a new configuration file
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("docsmith").join(CONFIG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(".").join(CONFIG_FILE_NAME))
    }

    /// Write a default configuration file. Existing files are kept unless `force`.
    #[instrument]
    pub fn init(path: &Path, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                key: "path".to_string(),
                value: format!("{} already exists", path.display()),
            }
            .into());
        }

        let config = DocsmithConfig::default();
        config.save_to_file(path)?;
        info!("Created default configuration at: {}", path.display());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: Some(path.to_path_buf()),
        })
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get current configuration (read-only)
    pub async fn get_config(&self) -> DocsmithConfig {
        self.config.read().await.clone()
    }

    /// Replace the configuration, persisting it when a file is attached
    #[instrument(skip(self, new_config))]
    pub async fn update_config(&self, new_config: DocsmithConfig) -> Result<()> {
        new_config.validate()?;

        if let Some(path) = &self.config_path {
            new_config.save_to_file(path)?;
        }
        *self.config.write().await = new_config;

        debug!("Configuration updated");
        Ok(())
    }

    /// Save current configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        self.config.read().await.save_to_file(path)?;
        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Get configuration value by dot-separated path, e.g. `scoring.pass_percent`
    pub async fn get_value(&self, key_path: &str) -> Option<Value> {
        let config = self.config.read().await;
        let tree = serde_json::to_value(&*config).ok()?;
        tree.pointer(&json_pointer(key_path)).cloned()
    }

    /// Set configuration value by dot-separated path.
    ///
    /// `raw` is read as a JSON scalar when possible (`80`, `true`, `0.5`) and
    /// as a string otherwise. The result must still validate.
    #[instrument(skip(self))]
    pub async fn set_value(&self, key_path: &str, raw: &str) -> Result<()> {
        let current = self.get_config().await;
        let mut tree = serde_json::to_value(&current)?;

        let slot = tree
            .pointer_mut(&json_pointer(key_path))
            .filter(|slot| !slot.is_object())
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key_path.to_string(),
                value: "unknown configuration key".to_string(),
            })?;
        *slot = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

        let updated: DocsmithConfig =
            serde_json::from_value(tree).map_err(|_| ConfigError::InvalidValue {
                key: key_path.to_string(),
                value: raw.to_string(),
            })?;
        self.update_config(updated).await
    }
}

fn json_pointer(key_path: &str) -> String {
    key_path
        .split('.')
        .filter(|part| !part.is_empty())
        .fold(String::new(), |mut pointer, part| {
            pointer.push('/');
            pointer.push_str(part);
            pointer
        })
}
