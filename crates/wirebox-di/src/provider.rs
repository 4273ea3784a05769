//! Service providers
//!
//! A [`ServiceProvider`] groups the bindings of one part of an application,
//! so the composition root can wire everything with a single registry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wirebox_di::{Container, DIResult, ServiceProvider, Value};
//!
//! pub struct MailProvider;
//!
//! impl ServiceProvider for MailProvider {
//!     fn name(&self) -> &'static str {
//!         "mail"
//!     }
//!
//!     fn register(&self, container: &Container) -> DIResult<()> {
//!         container.bind("mail.host", Value::from("smtp.example.com"))?;
//!         container.singleton("App\\Mailer", None)?;
//!         Ok(())
//!     }
//! }
//! ```
//!
//! For classes contributed by other crates, see
//! [`ClassRegistration`](crate::ClassRegistration).

use std::sync::Arc;

use crate::{Container, DIResult};

/// Trait for types that bind services into a container.
pub trait ServiceProvider: Send + Sync {
    /// Returns the name of this service provider.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Returns the priority of this service provider.
    ///
    /// Lower values are registered first. Default is 100.
    fn priority(&self) -> u32 {
        100
    }

    /// Bind services into the container.
    fn register(&self, container: &Container) -> DIResult<()>;

    /// Optional: check that what this provider needs is bound.
    ///
    /// Called after all providers have registered their services.
    #[allow(unused_variables)]
    fn validate(&self, container: &Container) -> DIResult<()> {
        Ok(())
    }
}

/// Registry for managing service providers.
#[derive(Default)]
pub struct ServiceProviderRegistry {
    providers: Vec<Arc<dyn ServiceProvider>>,
}

impl ServiceProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service provider to the registry.
    pub fn add<P: ServiceProvider + 'static>(&mut self, provider: P) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Add a shared service provider to the registry.
    pub fn add_shared(&mut self, provider: Arc<dyn ServiceProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in the order they were added.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Register all providers with the container, then validate them.
    ///
    /// Providers are registered in ascending priority; equal priorities keep
    /// the order they were added in.
    pub fn register_all(&self, container: &Container) -> DIResult<()> {
        let mut sorted: Vec<_> = self.providers.iter().collect();
        sorted.sort_by_key(|p| p.priority());

        tracing::info!("Registering {} service providers", sorted.len());

        for provider in &sorted {
            tracing::debug!(
                "Registering provider '{}' (priority: {})",
                provider.name(),
                provider.priority()
            );
            provider.register(container)?;
        }

        for provider in &sorted {
            provider.validate(container)?;
        }

        tracing::info!("All service providers registered successfully");
        Ok(())
    }
}
