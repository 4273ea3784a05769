//! The container: bindings, resolution and the public facade

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use wirebox_common::{validate_identifier, OrderedStore, SharedStore};
use wirebox_config::{ConfigManagerTrait, ContainerConfig};

use crate::reflection::{ClassRegistry, Parameter, TypeIntrospection, CONSTRUCTOR};
use crate::service::{Argument, ServiceDescriptor};
use crate::value::{Factory, Instance, Value};
use crate::{DIError, DIResult};

/// What an identifier is bound to
#[derive(Debug, Clone)]
pub enum Entry {
    /// A plain value or factory
    Value(Value),
    /// A class, instantiated on resolution
    Service(ServiceDescriptor),
}

impl Entry {
    pub fn as_service(&self) -> Option<&ServiceDescriptor> {
        match self {
            Entry::Service(service) => Some(service),
            Entry::Value(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Options {
    name_fallback: bool,
    detect_cycles: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name_fallback: true,
            detect_cycles: true,
        }
    }
}

/// Descriptors currently being resolved in one call tree.
///
/// Frames are compared by descriptor identity, so a nested descriptor for a
/// class is distinct from the binding of the same name.
struct ResolutionContext {
    chain: Vec<(String, ServiceDescriptor)>,
    detect_cycles: bool,
}

impl ResolutionContext {
    fn new(detect_cycles: bool) -> Self {
        Self {
            chain: Vec::new(),
            detect_cycles,
        }
    }

    fn enter(&mut self, label: &str, service: &ServiceDescriptor) -> DIResult<()> {
        if self.detect_cycles && self.chain.iter().any(|(_, active)| active.ptr_eq(service)) {
            let mut chain: Vec<&str> = self.chain.iter().map(|(label, _)| label.as_str()).collect();
            chain.push(label);
            return Err(DIError::CyclicDependency {
                chain: chain.join(" -> "),
            });
        }
        self.chain.push((label.to_string(), service.clone()));
        Ok(())
    }

    fn leave(&mut self) {
        self.chain.pop();
    }
}

/// Dependency injection container.
///
/// Cloning yields another handle to the same bindings.
#[derive(Clone)]
pub struct Container {
    store: SharedStore<Entry>,
    registry: Arc<ClassRegistry>,
    options: Options,
}

impl Container {
    /// Create an empty container over a class registry
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self::with_store(registry, Arc::new(OrderedStore::new()))
    }

    /// Create a container over a custom store
    pub fn with_store(registry: Arc<ClassRegistry>, store: SharedStore<Entry>) -> Self {
        Self {
            store,
            registry,
            options: Options::default(),
        }
    }

    /// Resolve untyped parameters by bare name from the container
    pub fn with_name_fallback(mut self, enabled: bool) -> Self {
        self.options.name_fallback = enabled;
        self
    }

    /// Fail with a cyclic dependency error instead of recursing forever
    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.options.detect_cycles = enabled;
        self
    }

    /// Create a container and apply a configuration to it
    pub fn from_config(registry: Arc<ClassRegistry>, config: &ContainerConfig) -> DIResult<Self> {
        let container = Self::new(registry)
            .with_name_fallback(config.name_fallback)
            .with_cycle_detection(config.detect_cycles);

        for (identifier, value) in &config.bindings {
            container.put(identifier, Value::Data(value.clone()))?;
        }
        for service in &config.services {
            let descriptor = container.register(&service.class, service.alias.as_deref())?;
            if service.singleton {
                descriptor.singleton();
            }
        }

        info!(
            "Container configured with {} bindings and {} services",
            config.bindings.len(),
            config.services.len()
        );
        Ok(container)
    }

    /// Create a container from configuration loaded by `manager`
    pub fn load<M: ConfigManagerTrait>(registry: Arc<ClassRegistry>, manager: &mut M) -> DIResult<Self> {
        let config = manager.load_config()?;
        Self::from_config(registry, &config)
    }

    /// The class registry services are built from
    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Bind a value to an identifier, unless the identifier is already bound.
    ///
    /// With no value, the identifier itself must be a registered class. Binding
    /// a [`Value::Class`] creates a service; if the identifier is a class too,
    /// the bound class must be the same class or a subclass of it.
    ///
    /// Returns `false` if the identifier was already bound.
    pub fn bind(&self, identifier: &str, value: impl Into<Option<Value>>) -> DIResult<bool> {
        let entry = self.entry_for(identifier, value.into())?;
        let added = self.store.add(identifier.to_string(), entry);
        if added {
            debug!("Bound {}", identifier);
        } else {
            warn!("Identifier [{}] is already bound, keeping existing entry", identifier);
        }
        Ok(added)
    }

    /// Like [`Container::bind`], but replaces an existing binding
    pub fn put(&self, identifier: &str, value: impl Into<Option<Value>>) -> DIResult<bool> {
        let entry = self.entry_for(identifier, value.into())?;
        if self.store.put(identifier.to_string(), entry).is_some() {
            debug!("Replaced binding for {}", identifier);
        } else {
            debug!("Bound {}", identifier);
        }
        Ok(true)
    }

    fn entry_for(&self, identifier: &str, value: Option<Value>) -> DIResult<Entry> {
        validate_identifier(identifier)?;

        let class = match value {
            None => identifier.to_string(),
            Some(Value::Class(class)) => class,
            Some(value) => return Ok(Entry::Value(value)),
        };

        if !self.registry.class_exists(&class) {
            return Err(DIError::must_be_class(&class));
        }
        if self.registry.class_exists(identifier)
            && !self.registry.is_subclass_or_same(&class, identifier)
        {
            return Err(DIError::invalid_argument(format!(
                "Class [{}] must be a subclass of [{}], or the same class.",
                class, identifier
            )));
        }

        let service = ServiceDescriptor::new(&class, Arc::clone(&self.registry))?;
        Ok(Entry::Service(service))
    }

    /// The raw entry bound to an identifier
    pub fn locate(&self, identifier: &str) -> DIResult<Entry> {
        validate_identifier(identifier)?;
        self.store
            .get(identifier)
            .ok_or_else(|| DIError::not_found(identifier))
    }

    /// Whether an identifier is bound. This does not mean [`Container::get`]
    /// will succeed, only that it will not fail with not found for it.
    pub fn has(&self, identifier: &str) -> DIResult<bool> {
        validate_identifier(identifier)?;
        Ok(self.store.has(identifier))
    }

    /// Resolve an identifier.
    ///
    /// Services are instantiated, factories are invoked on every call, and
    /// any other value is returned unchanged.
    pub fn get(&self, identifier: &str) -> DIResult<Value> {
        let mut context = ResolutionContext::new(self.options.detect_cycles);
        self.resolve(identifier, &mut context)
    }

    /// Resolve an identifier to an object of type `T`
    pub fn get_as<T: std::any::Any + Send + Sync>(&self, identifier: &str) -> DIResult<Arc<T>> {
        let value = self.get(identifier)?;
        value.downcast::<T>().ok_or_else(|| {
            DIError::invalid_argument(format!(
                "Entry [{}] is not a {}, got {}",
                identifier,
                std::any::type_name::<T>(),
                value.kind()
            ))
        })
    }

    /// Remove a binding; `false` if the identifier was not bound
    pub fn unbind(&self, identifier: &str) -> DIResult<bool> {
        validate_identifier(identifier)?;
        let removed = self.store.delete(identifier);
        if removed {
            debug!("Unbound {}", identifier);
        }
        Ok(removed)
    }

    /// Remove every binding
    pub fn clear(&self) {
        let count = self.store.len();
        self.store.clear();
        info!("Cleared {} bindings", count);
    }

    /// Bind a class to itself if needed, then resolve it
    pub fn make(&self, class: &str) -> DIResult<Value> {
        self.ensure_class(class)?;
        if !self.store.has(class) {
            self.bind(class, None)?;
        }
        self.get(class)
    }

    /// Bind `class` to `alias` (or to itself) and return its descriptor
    pub fn register(&self, class: &str, alias: Option<&str>) -> DIResult<ServiceDescriptor> {
        self.ensure_class(class)?;
        let target = alias.unwrap_or(class);
        self.bind(class, Value::class(target))?;
        self.service(class)
    }

    /// [`Container::register`] as a singleton
    pub fn singleton(&self, class: &str, alias: Option<&str>) -> DIResult<ServiceDescriptor> {
        Ok(self.register(class, alias)?.singleton())
    }

    /// The descriptor bound to an identifier
    pub fn service(&self, identifier: &str) -> DIResult<ServiceDescriptor> {
        match self.locate(identifier)? {
            Entry::Service(service) => Ok(service),
            Entry::Value(value) => Err(DIError::invalid_argument(format!(
                "Identifier [{}] is bound to {}, not a service.",
                identifier,
                value.kind()
            ))),
        }
    }

    /// A deferred call of `method` on an instance of `class`.
    ///
    /// The class and method are checked now, and `overrides` are merged into
    /// the class's descriptor. The instance and method arguments are resolved
    /// each time the factory is invoked.
    pub fn closure_for<K, A, I>(&self, class: &str, method: &str, overrides: I) -> DIResult<Factory>
    where
        K: Into<String>,
        A: Into<Argument>,
        I: IntoIterator<Item = (K, A)>,
    {
        self.ensure_class(class)?;
        if !self.store.has(class) {
            self.bind(class, None)?;
        }
        let service = self.service(class)?.set_arguments(overrides);

        if !self.registry.has_method(service.class_name(), method) {
            return Err(DIError::BadMethodCall {
                class: service.class_name().to_string(),
                method: method.to_string(),
            });
        }

        let container = self.clone();
        let identifier = class.to_string();
        let method = method.to_string();
        Ok(Factory::new(move || {
            let mut context = ResolutionContext::new(container.options.detect_cycles);
            context.enter(&identifier, &service)?;
            let instance = container.instantiate(&service, &mut context)?;
            let arguments = container.arguments(&service, &method, &mut context)?;
            context.leave();
            container.registry.call_method(&instance, &method, arguments)
        }))
    }

    /// Bind several values; stops at the first error
    pub fn bind_multiple<K, V, I>(&self, items: I) -> DIResult<bool>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut count = 0;
        for (identifier, value) in items {
            self.bind(identifier.as_ref(), value.into())?;
            count += 1;
        }
        info!("Bound {} entries", count);
        Ok(true)
    }

    /// Resolve several identifiers, in order
    pub fn get_multiple<S: AsRef<str>>(&self, identifiers: &[S]) -> DIResult<Vec<Value>> {
        identifiers
            .iter()
            .map(|identifier| self.get(identifier.as_ref()))
            .collect()
    }

    pub fn unbind_multiple<S: AsRef<str>>(&self, identifiers: &[S]) -> DIResult<bool> {
        for identifier in identifiers {
            self.unbind(identifier.as_ref())?;
        }
        info!("Unbound {} entries", identifiers.len());
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Bound identifiers, in binding order
    pub fn identifiers(&self) -> Vec<String> {
        self.store.keys()
    }

    fn ensure_class(&self, class: &str) -> DIResult<()> {
        validate_identifier(class)?;
        if !self.registry.class_exists(class) {
            return Err(DIError::must_be_class(class));
        }
        Ok(())
    }

    fn resolve(&self, identifier: &str, context: &mut ResolutionContext) -> DIResult<Value> {
        match self.locate(identifier)? {
            Entry::Service(service) => {
                context.enter(identifier, &service)?;
                let instance = self.instantiate(&service, context);
                context.leave();
                instance.map(Value::Object)
            }
            Entry::Value(Value::Factory(factory)) => factory.call(),
            Entry::Value(value) => Ok(value),
        }
    }

    fn instantiate(&self, service: &ServiceDescriptor, context: &mut ResolutionContext) -> DIResult<Instance> {
        if service.has_instance() {
            return service.get_instance(Vec::new());
        }

        let arguments = self.arguments(service, CONSTRUCTOR, context)?;
        service.get_instance(arguments)
    }

    /// Resolve the arguments for `method` on a service.
    ///
    /// Per parameter: explicit argument, then the container, then the
    /// default. A missing required parameter fails with not found, naming the
    /// method that asked for it.
    fn arguments(
        &self,
        service: &ServiceDescriptor,
        method: &str,
        context: &mut ResolutionContext,
    ) -> DIResult<Vec<Value>> {
        let parameters = service.parameters(method)?;
        if parameters.is_empty() {
            return Ok(Vec::new());
        }

        let mut arguments = Vec::with_capacity(parameters.len());
        for parameter in &parameters {
            let resolved = match self.argument_from_service(service, parameter, context)? {
                Some(value) => Ok(value),
                None => self.argument_from_container(parameter, context),
            };

            match resolved {
                Ok(value) => arguments.push(value),
                Err(DIError::NotFound { identifier, .. }) if parameter.is_optional() => {
                    warn!(
                        "No entry for [{}], using default for parameter ${} of {}::{}()",
                        identifier,
                        parameter.name(),
                        service.class_name(),
                        method
                    );
                    arguments.push(parameter.default_value());
                }
                Err(DIError::NotFound { identifier, mut trail }) => {
                    trail.push(format!("{}::{}()", service.class_name(), method));
                    return Err(DIError::NotFound { identifier, trail });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(arguments)
    }

    /// Explicit argument for a parameter, by declared class then by name.
    /// A null override counts as absent.
    fn argument_from_service(
        &self,
        service: &ServiceDescriptor,
        parameter: &Parameter,
        context: &mut ResolutionContext,
    ) -> DIResult<Option<Value>> {
        let argument = parameter
            .class()
            .and_then(|class| service.argument(class))
            .or_else(|| service.argument(parameter.name()));

        match argument {
            None => Ok(None),
            Some(Argument::Value(value)) if value.is_null() => Ok(None),
            Some(Argument::Value(value)) => Ok(Some(value)),
            Some(Argument::Service(nested)) => {
                context.enter(nested.class_name(), &nested)?;
                let instance = self.instantiate(&nested, context);
                context.leave();
                instance.map(|instance| Some(Value::Object(instance)))
            }
        }
    }

    fn argument_from_container(&self, parameter: &Parameter, context: &mut ResolutionContext) -> DIResult<Value> {
        if parameter.class().is_none() && !self.options.name_fallback {
            return Err(DIError::not_found(parameter.name()));
        }
        self.resolve(parameter.key(), context)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("identifiers", &self.store.keys())
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}
