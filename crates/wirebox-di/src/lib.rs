//! Dependency Injection Container for Wirebox
//!
//! A string-keyed container that stores plain values, factories and class
//! services, and resolves class services by recursively resolving their
//! constructor parameters from the same container.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wirebox_di::{ClassDefinition, ClassRegistry, Container, Parameter, Value};
//!
//! struct Config { dsn: String }
//! struct Database { config: Arc<Config> }
//!
//! let registry = ClassRegistry::new()
//!     .with(ClassDefinition::new("App\\Config").constructor(
//!         vec![Parameter::named("dsn")],
//!         |args| Ok(Config { dsn: args.string(0)? }),
//!     ))
//!     .unwrap()
//!     .with(ClassDefinition::new("App\\Database").constructor(
//!         vec![Parameter::typed("config", "App\\Config")],
//!         |args| Ok(Database { config: args.object::<Config>(0)? }),
//!     ))
//!     .unwrap();
//!
//! let container = Container::new(Arc::new(registry));
//! container.bind("dsn", Value::from("sqlite::memory:")).unwrap();
//! container.bind("App\\Config", None).unwrap();
//! container.singleton("App\\Database", None).unwrap();
//!
//! let db = container.get_as::<Database>("App\\Database").unwrap();
//! assert_eq!(db.config.dsn, "sqlite::memory:");
//! ```
//!
//! See [`usage`] module for detailed usage examples.

pub mod container;
pub mod global;
pub mod provider;
pub mod reflection;
pub mod registration;
pub mod service;
pub mod usage;
pub mod value;

use std::fmt;

use wirebox_common::ValidationError;
use wirebox_config::ConfigError;

/// Errors that can occur during dependency injection operations
#[derive(Debug, thiserror::Error)]
pub enum DIError {
    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("No entry was found for [{identifier}] identifier.{trail}")]
    NotFound { identifier: String, trail: Trail },

    #[error("Method [{class}::{method}()] does not exist.")]
    BadMethodCall { class: String, method: String },

    #[error("Cyclic dependency detected: {chain}")]
    CyclicDependency { chain: String },

    #[error("Class already registered: {class}")]
    ClassAlreadyRegistered { class: String },

    #[error("Class [{class}] is not instantiable.")]
    NotInstantiable { class: String },

    #[error("Failed to construct [{class}]: {message}")]
    ConstructionFailed { class: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Default container is already initialized")]
    GlobalAlreadyInitialized,
}

pub type DIResult<T> = Result<T, DIError>;

impl DIError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
            trail: Trail::default(),
        }
    }

    /// For constructors and methods reporting their own failures
    pub fn construction_failed(class: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ConstructionFailed {
            class: class.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn must_be_class(identifier: &str) -> Self {
        Self::invalid_argument(format!("Identifier [{}] must be a valid class.", identifier))
    }

    pub(crate) fn must_be_instance_of(class: &str) -> Self {
        Self::invalid_argument(format!("Argument provided is not an instance of [{}].", class))
    }

    /// Whether this is a not-found error, at any depth of the resolution
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ValidationError> for DIError {
    fn from(err: ValidationError) -> Self {
        Self::invalid_argument(format!("Identifier must be a non empty string: {}", err))
    }
}

/// The `Class::method()` frames a not-found error travelled through.
///
/// Renders as one ` Requested on [Class::method()].` sentence per frame,
/// innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trail(Vec<String>);

impl Trail {
    pub fn push(&mut self, frame: impl Into<String>) {
        self.0.push(frame.into());
    }

    pub fn frames(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.0 {
            write!(f, " Requested on [{}].", frame)?;
        }
        Ok(())
    }
}

/// Service lifetime management
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceLifetime {
    /// The first constructed instance is cached and reused
    Singleton,
    /// A new instance is constructed on every resolution
    #[default]
    Transient,
}

pub use container::{Container, Entry};
pub use provider::{ServiceProvider, ServiceProviderRegistry};
pub use reflection::{
    Arguments, ClassDefinition, ClassRegistry, Parameter, TypeIntrospection, CONSTRUCTOR,
};
pub use registration::{discovered_class_count, list_discovered_classes, ClassRegistration};
pub use service::{Argument, ServiceDescriptor};
pub use value::{Factory, Instance, Value};

// Re-exported so `inventory::submit!` works without a direct dependency
pub use inventory;
