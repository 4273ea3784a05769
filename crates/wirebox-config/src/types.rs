//! Core configuration types and data structures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wirebox_common::{validate_identifier, Validatable, ValidationError};

/// Container configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContainerConfig {
    /// Resolve untyped constructor parameters from the container by their
    /// bare parameter name. Two services with a same-named untyped parameter
    /// then share the same container entry.
    pub name_fallback: bool,
    /// Fail with a cyclic dependency error instead of recursing forever
    pub detect_cycles: bool,
    /// Plain values bound when the container is built
    pub bindings: BTreeMap<String, serde_json::Value>,
    /// Classes registered when the container is built
    pub services: Vec<ServiceConfig>,
}

/// A class registration declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Class the service is bound under
    pub class: String,
    /// Implementation class, when it differs from `class`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Cache the first instance
    #[serde(default)]
    pub singleton: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name_fallback: true,
            detect_cycles: true,
            bindings: BTreeMap::new(),
            services: Vec::new(),
        }
    }
}

impl ServiceConfig {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            alias: None,
            singleton: false,
        }
    }
}

impl Validatable for ServiceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_identifier(&self.class)?;
        if let Some(alias) = &self.alias {
            validate_identifier(alias)?;
        }
        Ok(())
    }
}

/// Configuration manager trait
pub trait ConfigManager {
    /// Load configuration
    fn load_config(&mut self) -> Result<ContainerConfig, crate::error::ConfigError>;
    /// Save configuration
    fn save_config(&self, config: &ContainerConfig) -> Result<(), crate::error::ConfigError>;
    /// Validate configuration
    fn validate_config(&self, config: &ContainerConfig) -> Result<(), crate::error::ConfigError>;
}
