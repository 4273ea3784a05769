//! Wirebox container configuration
//!
//! Loads [`ContainerConfig`] from an optional TOML file layered with
//! `WIREBOX_*` environment variables, and validates it before the container
//! applies it.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{ConfigManager as ConfigManagerTrait, ContainerConfig, ServiceConfig};
