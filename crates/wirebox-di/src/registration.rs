//! Auto-discovery class registration using inventory crate
//!
//! Each crate can describe its classes with `inventory::submit!` and they
//! are collected into a [`ClassRegistry`] at runtime.
//!
//! ## Usage
//!
//! In a feature crate:
//!
//! ```rust,ignore
//! use wirebox_di::{ClassDefinition, ClassRegistration, Parameter};
//!
//! wirebox_di::inventory::submit! {
//!     ClassRegistration::new("App\\Mailer", || {
//!         ClassDefinition::new("App\\Mailer")
//!             .constructor(vec![Parameter::named("host")], |args| {
//!                 Ok(Mailer::new(args.string(0)?))
//!             })
//!     })
//! }
//! ```
//!
//! At the composition root:
//!
//! ```rust,ignore
//! let registry = ClassRegistry::discover()?;
//! let container = Container::new(Arc::new(registry));
//! ```

use tracing::{debug, info};

use crate::reflection::{ClassDefinition, ClassRegistry};
use crate::DIResult;

/// A class definition that can be collected via inventory.
pub struct ClassRegistration {
    /// Name of the class the definition describes
    pub name: &'static str,

    /// Builds the class definition
    pub define: fn() -> ClassDefinition,

    /// Registration order (lower = earlier, default = 100)
    pub priority: u32,
}

impl ClassRegistration {
    /// Create a new class registration with default priority
    pub const fn new(name: &'static str, define: fn() -> ClassDefinition) -> Self {
        Self {
            name,
            define,
            priority: 100,
        }
    }

    /// Create a new class registration with custom priority
    pub const fn with_priority(
        name: &'static str,
        define: fn() -> ClassDefinition,
        priority: u32,
    ) -> Self {
        Self {
            name,
            define,
            priority,
        }
    }
}

// Collect all ClassRegistration instances across all crates
inventory::collect!(ClassRegistration);

impl ClassRegistry {
    /// Build a registry from every linked [`ClassRegistration`].
    pub fn discover() -> DIResult<Self> {
        let mut registry = Self::new();
        registry.register_discovered()?;
        Ok(registry)
    }

    /// Add every linked [`ClassRegistration`] to this registry.
    ///
    /// Registrations run in priority order; equal priorities keep link order.
    pub fn register_discovered(&mut self) -> DIResult<usize> {
        let mut registrations: Vec<&ClassRegistration> =
            inventory::iter::<ClassRegistration>().collect();
        registrations.sort_by_key(|r| r.priority);

        info!(
            "Discovered {} class registrations via inventory",
            registrations.len()
        );

        for registration in &registrations {
            debug!(
                "Registering class '{}' (priority: {})",
                registration.name, registration.priority
            );
            self.register((registration.define)())?;
        }

        Ok(registrations.len())
    }
}

/// Get the count of discovered class registrations.
pub fn discovered_class_count() -> usize {
    inventory::iter::<ClassRegistration>().count()
}

/// List all discovered class names.
pub fn list_discovered_classes() -> Vec<&'static str> {
    inventory::iter::<ClassRegistration>()
        .map(|r| r.name)
        .collect()
}
