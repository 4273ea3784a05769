//! Service descriptors
//!
//! A [`ServiceDescriptor`] is the binding record for a class: how its
//! constructor arguments are overridden, whether the first instance is
//! cached, and which methods run on every freshly built instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::reflection::{ClassRegistry, Parameter, TypeIntrospection};
use crate::value::{Factory, Instance, Value};
use crate::{DIError, DIResult, ServiceLifetime};

/// Explicit per-service argument override
#[derive(Debug, Clone)]
pub enum Argument {
    /// Used as-is
    Value(Value),
    /// Instantiated whenever the argument is needed
    Service(ServiceDescriptor),
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Value(value)
    }
}

impl From<ServiceDescriptor> for Argument {
    fn from(service: ServiceDescriptor) -> Self {
        Argument::Service(service)
    }
}

#[derive(Debug, Clone)]
struct Hook {
    method: String,
    arguments: Vec<Value>,
}

#[derive(Debug, Clone)]
enum InstanceSlot {
    Empty,
    Pending(Factory),
    Ready(Instance),
}

#[derive(Debug)]
struct ServiceState {
    lifetime: ServiceLifetime,
    instance: InstanceSlot,
    arguments: HashMap<String, Argument>,
    hooks: Vec<Hook>,
}

/// Binding record for a class.
///
/// Cloning yields another handle to the same descriptor; changes made
/// through one handle are visible through all of them.
#[derive(Clone)]
pub struct ServiceDescriptor {
    class: Arc<str>,
    registry: Arc<ClassRegistry>,
    state: Arc<Mutex<ServiceState>>,
}

impl ServiceDescriptor {
    /// Create a transient descriptor for a registered class
    pub fn new(class: &str, registry: Arc<ClassRegistry>) -> DIResult<Self> {
        if !registry.class_exists(class) {
            return Err(DIError::must_be_class(class));
        }

        Ok(Self {
            class: Arc::from(class),
            registry,
            state: Arc::new(Mutex::new(ServiceState {
                lifetime: ServiceLifetime::Transient,
                instance: InstanceSlot::Empty,
                arguments: HashMap::new(),
                hooks: Vec::new(),
            })),
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.state.lock().lifetime
    }

    pub fn is_singleton(&self) -> bool {
        self.lifetime() == ServiceLifetime::Singleton
    }

    /// Whether a cached or pending instance is held
    pub fn has_instance(&self) -> bool {
        !matches!(self.state.lock().instance, InstanceSlot::Empty)
    }

    /// Cache the first constructed instance
    pub fn singleton(&self) -> Self {
        self.set_singleton(true)
    }

    pub fn set_singleton(&self, singleton: bool) -> Self {
        self.state.lock().lifetime = if singleton {
            ServiceLifetime::Singleton
        } else {
            ServiceLifetime::Transient
        };
        self.clone()
    }

    /// Supply the instance up front, as an object or as a factory invoked on
    /// first use. Either way the descriptor becomes a singleton.
    pub fn set_instance(&self, candidate: impl Into<Value>) -> DIResult<Self> {
        let slot = match candidate.into() {
            Value::Factory(factory) => InstanceSlot::Pending(factory),
            Value::Object(instance) if self.registry.is_instance_of(&instance, &self.class) => {
                InstanceSlot::Ready(instance)
            }
            _ => return Err(DIError::must_be_instance_of(&self.class)),
        };

        let mut state = self.state.lock();
        state.instance = slot;
        state.lifetime = ServiceLifetime::Singleton;
        drop(state);
        Ok(self.clone())
    }

    /// Call `method` on every freshly constructed instance.
    ///
    /// When the first argument is a factory, it is invoked and its result
    /// passed in its place.
    pub fn after_construct(&self, method: &str, arguments: Vec<Value>) -> DIResult<Self> {
        if !self.registry.has_method(&self.class, method) {
            return Err(DIError::BadMethodCall {
                class: self.class.to_string(),
                method: method.to_string(),
            });
        }

        self.state.lock().hooks.push(Hook {
            method: method.to_string(),
            arguments,
        });
        Ok(self.clone())
    }

    /// Drop any cached or pending instance and go back to transient
    pub fn clear(&self) -> Self {
        let mut state = self.state.lock();
        state.instance = InstanceSlot::Empty;
        state.lifetime = ServiceLifetime::Transient;
        drop(state);
        self.clone()
    }

    /// Override the argument for a parameter, keyed by its declared class
    /// or its name
    pub fn set_argument(&self, key: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.state.lock().arguments.insert(key.into(), argument.into());
        self.clone()
    }

    pub fn set_arguments<K, A, I>(&self, arguments: I) -> Self
    where
        K: Into<String>,
        A: Into<Argument>,
        I: IntoIterator<Item = (K, A)>,
    {
        let mut state = self.state.lock();
        for (key, argument) in arguments {
            state.arguments.insert(key.into(), argument.into());
        }
        drop(state);
        self.clone()
    }

    /// Override an argument with a fresh instance of `class` each time
    pub fn set_service_argument(&self, key: impl Into<String>, class: &str) -> DIResult<Self> {
        let service = ServiceDescriptor::new(class, Arc::clone(&self.registry))?;
        Ok(self.set_argument(key, service))
    }

    pub fn has_argument(&self, key: &str) -> bool {
        self.state.lock().arguments.contains_key(key)
    }

    pub fn argument(&self, key: &str) -> Option<Argument> {
        self.state.lock().arguments.get(key).cloned()
    }

    /// Declared parameters of `method` on this descriptor's class
    pub fn parameters(&self, method: &str) -> DIResult<Vec<Parameter>> {
        self.registry.method_parameters(&self.class, method)
    }

    /// Return the cached instance, or build a new one from resolved
    /// constructor arguments.
    pub fn get_instance(&self, arguments: Vec<Value>) -> DIResult<Instance> {
        let slot = self.state.lock().instance.clone();
        match slot {
            InstanceSlot::Ready(instance) => return Ok(instance),
            InstanceSlot::Pending(factory) => return self.resolve_pending(factory),
            InstanceSlot::Empty => {}
        }

        debug!("Constructing instance of {}", self.class);
        let instance = self.registry.construct(&self.class, arguments)?;

        let hooks = self.state.lock().hooks.clone();
        for hook in hooks {
            self.run_hook(&instance, hook)?;
        }

        let mut state = self.state.lock();
        if state.lifetime == ServiceLifetime::Singleton {
            // A nested resolution may have filled the slot meanwhile
            if let InstanceSlot::Ready(existing) = &state.instance {
                return Ok(existing.clone());
            }
            state.instance = InstanceSlot::Ready(instance.clone());
        }
        Ok(instance)
    }

    fn resolve_pending(&self, factory: Factory) -> DIResult<Instance> {
        let instance = match factory.call()? {
            Value::Object(instance) if self.registry.is_instance_of(&instance, &self.class) => {
                instance
            }
            _ => return Err(DIError::must_be_instance_of(&self.class)),
        };

        self.state.lock().instance = InstanceSlot::Ready(instance.clone());
        Ok(instance)
    }

    fn run_hook(&self, instance: &Instance, hook: Hook) -> DIResult<()> {
        debug!("Running {}::{}() after construct", self.class, hook.method);

        let mut arguments = hook.arguments;
        if let Some(Value::Factory(factory)) = arguments.first() {
            let resolved = factory.call()?;
            arguments[0] = resolved;
        }

        self.registry.call_method(instance, &hook.method, arguments)?;
        Ok(())
    }

    /// Whether both handles refer to the same descriptor
    pub fn ptr_eq(&self, other: &ServiceDescriptor) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ServiceDescriptor")
            .field("class", &self.class)
            .field("lifetime", &state.lifetime)
            .field("instance", &state.instance)
            .field("arguments", &state.arguments.keys().collect::<Vec<_>>())
            .field("hooks", &state.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::ClassDefinition;

    struct Mailer {
        sent: Mutex<Vec<String>>,
    }

    struct Other;

    fn registry() -> Arc<ClassRegistry> {
        let registry = ClassRegistry::new()
            .with(
                ClassDefinition::new("Tests\\Mailer")
                    .constructor(vec![], |_| {
                        Ok(Mailer {
                            sent: Mutex::new(Vec::new()),
                        })
                    })
                    .method::<Mailer, _>("send", vec![Parameter::named("to")], |this, args| {
                        this.sent.lock().push(args.string(0)?);
                        Ok(Value::null())
                    }),
            )
            .unwrap()
            .with(ClassDefinition::new("Tests\\Other").constructor(vec![], |_| Ok(Other)))
            .unwrap();
        Arc::new(registry)
    }

    fn mailer() -> ServiceDescriptor {
        ServiceDescriptor::new("Tests\\Mailer", registry()).unwrap()
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let err = ServiceDescriptor::new("Tests\\Missing", registry()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Identifier [Tests\\Missing] must be a valid class."
        );
    }

    #[test]
    fn test_transient_builds_fresh_instances() {
        let service = mailer();
        assert!(!service.is_singleton());

        let first = service.get_instance(vec![]).unwrap();
        let second = service.get_instance(vec![]).unwrap();
        assert!(!first.ptr_eq(&second));
        assert!(!service.has_instance());
    }

    #[test]
    fn test_singleton_caches_until_cleared() {
        let service = mailer().singleton();
        let first = service.get_instance(vec![]).unwrap();
        let second = service.get_instance(vec![]).unwrap();
        assert!(first.ptr_eq(&second));
        assert!(service.has_instance());

        service.clear();
        assert!(!service.is_singleton());
        assert!(!service.has_instance());
        let third = service.get_instance(vec![]).unwrap();
        assert!(!first.ptr_eq(&third));
    }

    #[test]
    fn test_set_instance_accepts_matching_object_only() {
        let service = mailer();
        let err = service
            .set_instance(Value::object("Tests\\Other", Other))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument provided is not an instance of [Tests\\Mailer]."
        );
        assert!(service.set_instance("plain").is_err());

        let given = Instance::new(
            "Tests\\Mailer",
            Mailer {
                sent: Mutex::new(Vec::new()),
            },
        );
        service.set_instance(given.clone()).unwrap();
        assert!(service.is_singleton());
        assert!(service.get_instance(vec![]).unwrap().ptr_eq(&given));
    }

    #[test]
    fn test_pending_factory_runs_once() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let service = mailer()
            .set_instance(Factory::new(move || {
                *counter.lock() += 1;
                Ok(Value::object(
                    "Tests\\Mailer",
                    Mailer {
                        sent: Mutex::new(Vec::new()),
                    },
                ))
            }))
            .unwrap();

        let first = service.get_instance(vec![]).unwrap();
        let second = service.get_instance(vec![]).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(*calls.lock(), 1);
    }

    #[test]
    fn test_pending_factory_must_build_the_class() {
        let service = mailer()
            .set_instance(Value::factory(|| Ok(Value::object("Tests\\Other", Other))))
            .unwrap();
        assert!(service.get_instance(vec![]).is_err());
    }

    #[test]
    fn test_hooks_run_in_order() {
        let service = mailer()
            .after_construct("send", vec![Value::from("first")])
            .unwrap()
            .after_construct("send", vec![Value::factory(|| Ok(Value::from("second")))])
            .unwrap();

        let instance = service.get_instance(vec![]).unwrap();
        let mailer = instance.downcast::<Mailer>().unwrap();
        assert_eq!(*mailer.sent.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_after_construct_requires_method() {
        let err = mailer().after_construct("missing", vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Method [Tests\\Mailer::missing()] does not exist."
        );
    }

    #[test]
    fn test_arguments_are_shared_between_handles() {
        let service = mailer();
        let handle = service.clone();
        handle.set_argument("to", Value::from("ops@example.com"));
        service.set_service_argument("Tests\\Other", "Tests\\Other").unwrap();

        assert!(service.has_argument("to"));
        assert!(matches!(
            service.argument("Tests\\Other"),
            Some(Argument::Service(_))
        ));
        assert!(service.ptr_eq(&handle));
        assert!(service.set_service_argument("x", "Tests\\Missing").is_err());
    }
}
