//! Configuration manager implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment};
use serde::Deserialize;
use tracing::debug;
use wirebox_common::{validate_identifier, Validatable};

use crate::{
    error::{ConfigError, Result},
    types::{ConfigManager as ConfigManagerTrait, ContainerConfig},
};

/// Configuration manager
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    /// Environment prefix
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: "WIREBOX".to_string(),
        }
    }

    /// Create with custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: "WIREBOX".to_string(),
        }
    }

    /// Override the environment variable prefix
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get default config path
    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wirebox")
            .join("config.toml")
    }
}

/// Settings taken from environment variables. Keys arrive lowercased.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvOverrides {
    name_fallback: Option<bool>,
    detect_cycles: Option<bool>,
    bindings: BTreeMap<String, serde_json::Value>,
}

impl EnvOverrides {
    fn apply(self, config: &mut ContainerConfig) {
        if let Some(name_fallback) = self.name_fallback {
            config.name_fallback = name_fallback;
        }
        if let Some(detect_cycles) = self.detect_cycles {
            config.detect_cycles = detect_cycles;
        }
        config.bindings.extend(self.bindings);
    }
}

impl ConfigManager {
    /// Parse the configuration file as written, keeping key case
    fn load_file(&self) -> Result<ContainerConfig> {
        if !self.config_path.exists() {
            return Ok(ContainerConfig::default());
        }
        let contents = std::fs::read_to_string(&self.config_path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn load_env(&self) -> Result<EnvOverrides> {
        // WIREBOX_NAME_FALLBACK=false, WIREBOX_BINDINGS__APP_NAME=demo
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

impl ConfigManagerTrait for ConfigManager {
    fn load_config(&mut self) -> Result<ContainerConfig> {
        debug!("Loading container configuration from {}", self.config_path.display());

        let mut container_config = self.load_file()?;
        self.load_env()?.apply(&mut container_config);
        self.validate_config(&container_config)?;
        Ok(container_config)
    }

    fn save_config(&self, config: &ContainerConfig) -> Result<()> {
        let toml = toml::to_string(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }

    fn validate_config(&self, config: &ContainerConfig) -> Result<()> {
        for key in config.bindings.keys() {
            validate_identifier(key).map_err(|e| {
                ConfigError::Validation(format!("Invalid binding key [{}]: {}", key, e))
            })?;
        }
        for service in &config.services {
            service.validate().map_err(|e| {
                ConfigError::Validation(format!("Invalid service [{}]: {}", service.class, e))
            })?;
        }
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
