//! Class registry and type introspection
//!
//! Classes are described up front with [`ClassDefinition`]: their name, the
//! classes they extend or implement, a constructor with declared parameters,
//! and callable methods. The container only ever instantiates classes found
//! in a [`ClassRegistry`]; it never guesses from the shape of a string.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;
use wirebox_common::validate_identifier;

use crate::value::{AnyObject, Instance, Value};
use crate::{DIError, DIResult};

/// Method name under which constructor parameters are looked up
pub const CONSTRUCTOR: &str = "new";

/// A declared constructor or method parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    class: Option<String>,
    default: Option<Value>,
    nullable: bool,
}

impl Parameter {
    /// Untyped parameter, resolved by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            default: None,
            nullable: false,
        }
    }

    /// Parameter declared as an instance of `class`
    pub fn typed(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::named(name)
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accept null; a nullable parameter without a default defaults to null
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared class, if any
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or_else(Value::null)
    }

    pub fn is_optional(&self) -> bool {
        self.has_default() || self.nullable
    }

    /// Lookup key: the declared class if present, else the parameter name
    pub fn key(&self) -> &str {
        self.class.as_deref().unwrap_or(&self.name)
    }
}

/// Positional arguments handed to a constructor or method
#[derive(Debug, Clone)]
pub struct Arguments {
    owner: String,
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(owner: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            owner: owner.into(),
            values,
        }
    }

    /// `Class::method()` these arguments were resolved for
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> DIResult<&Value> {
        self.values.get(index).ok_or_else(|| {
            DIError::invalid_argument(format!(
                "Missing argument #{} for [{}]",
                index, self.owner
            ))
        })
    }

    pub fn data(&self, index: usize) -> DIResult<&serde_json::Value> {
        let value = self.value(index)?;
        value
            .as_data()
            .ok_or_else(|| self.mismatch(index, "data", value))
    }

    pub fn str(&self, index: usize) -> DIResult<&str> {
        let value = self.value(index)?;
        value
            .as_str()
            .ok_or_else(|| self.mismatch(index, "a string", value))
    }

    pub fn string(&self, index: usize) -> DIResult<String> {
        self.str(index).map(str::to_string)
    }

    pub fn i64(&self, index: usize) -> DIResult<i64> {
        let value = self.value(index)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch(index, "an integer", value))
    }

    pub fn f64(&self, index: usize) -> DIResult<f64> {
        let value = self.value(index)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(index, "a number", value))
    }

    pub fn bool(&self, index: usize) -> DIResult<bool> {
        let value = self.value(index)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "a boolean", value))
    }

    pub fn instance(&self, index: usize) -> DIResult<&Instance> {
        let value = self.value(index)?;
        value
            .as_instance()
            .ok_or_else(|| self.mismatch(index, "an object", value))
    }

    pub fn object<T: Any + Send + Sync>(&self, index: usize) -> DIResult<Arc<T>> {
        let value = self.value(index)?;
        value
            .downcast::<T>()
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<T>(), value))
    }

    /// Like [`Arguments::object`], but null yields `None`
    pub fn optional_object<T: Any + Send + Sync>(&self, index: usize) -> DIResult<Option<Arc<T>>> {
        match self.values.get(index) {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(_) => self.object::<T>(index).map(Some),
        }
    }

    fn mismatch(&self, index: usize, expected: &str, actual: &Value) -> DIError {
        DIError::invalid_argument(format!(
            "Argument #{} for [{}] must be {}, got {}",
            index,
            self.owner,
            expected,
            actual.kind()
        ))
    }
}

type ConstructorFn = Arc<dyn Fn(Arguments) -> DIResult<AnyObject> + Send + Sync>;
type MethodFn = Arc<dyn Fn(&Instance, Arguments) -> DIResult<Value> + Send + Sync>;

#[derive(Clone)]
struct Constructor {
    parameters: Vec<Parameter>,
    build: ConstructorFn,
}

#[derive(Clone)]
struct Method {
    parameters: Vec<Parameter>,
    call: MethodFn,
}

/// Description of a constructible (or abstract) class
#[derive(Clone)]
pub struct ClassDefinition {
    name: String,
    parents: Vec<String>,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method>,
}

impl ClassDefinition {
    /// A class with no constructor yet. Without one it is abstract: it can
    /// be bound to and extended, but not instantiated.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            constructor: None,
            methods: HashMap::new(),
        }
    }

    /// Declare a parent class or implemented interface
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    pub fn constructor<T, F>(mut self, parameters: Vec<Parameter>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Arguments) -> DIResult<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            parameters,
            build: Arc::new(move |args: Arguments| -> DIResult<AnyObject> {
                Ok(Arc::new(build(args)?))
            }),
        });
        self
    }

    /// Declare a method callable on instances whose concrete type is `T`
    pub fn method<T, F>(mut self, name: impl Into<String>, parameters: Vec<Parameter>, call: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, Arguments) -> DIResult<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let owner = format!("{}::{}()", self.name, name);
        let invoke: MethodFn = Arc::new(move |instance: &Instance, args: Arguments| {
            let this = instance.downcast_ref::<T>().ok_or_else(|| {
                DIError::invalid_argument(format!(
                    "[{}] cannot be called on an instance of [{}]",
                    owner,
                    instance.class_name()
                ))
            })?;
            call(this, args)
        });
        self.methods.insert(
            name,
            Method {
                parameters,
                call: invoke,
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("instantiable", &self.is_instantiable())
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Parameter metadata and class relationships the resolution engine needs
pub trait TypeIntrospection: Send + Sync {
    /// Whether `class` is known
    fn class_exists(&self, class: &str) -> bool;

    /// Whether `class` is `parent` or (transitively) extends it
    fn is_subclass_or_same(&self, class: &str, parent: &str) -> bool;

    /// Ordered constructor parameters; empty for abstract classes
    fn constructor_parameters(&self, class: &str) -> DIResult<Vec<Parameter>>;

    /// Ordered parameters of `method`
    fn method_parameters(&self, class: &str, method: &str) -> DIResult<Vec<Parameter>>;

    /// Whether instances of `class` can receive `method`
    fn has_method(&self, class: &str, method: &str) -> bool;
}

/// The set of classes a container may instantiate
#[derive(Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassDefinition>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class definition
    pub fn register(&mut self, definition: ClassDefinition) -> DIResult<()> {
        validate_identifier(definition.name())?;

        if self.classes.contains_key(definition.name()) {
            return Err(DIError::ClassAlreadyRegistered {
                class: definition.name().to_string(),
            });
        }
        if definition.has_method(CONSTRUCTOR) {
            return Err(DIError::invalid_argument(format!(
                "Class [{}] declares a method named [{}], which is reserved for the constructor",
                definition.name(),
                CONSTRUCTOR
            )));
        }

        debug!("Registered class: {}", definition.name());
        self.classes
            .insert(definition.name().to_string(), definition);
        Ok(())
    }

    /// Builder-style [`ClassRegistry::register`]
    pub fn with(mut self, definition: ClassDefinition) -> DIResult<Self> {
        self.register(definition)?;
        Ok(self)
    }

    pub fn definition(&self, class: &str) -> Option<&ClassDefinition> {
        self.classes.get(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn require(&self, class: &str) -> DIResult<&ClassDefinition> {
        self.classes
            .get(class)
            .ok_or_else(|| DIError::must_be_class(class))
    }

    /// Build a new instance of `class` from already resolved arguments
    pub fn construct(&self, class: &str, arguments: Vec<Value>) -> DIResult<Instance> {
        let definition = self.require(class)?;
        let constructor = definition
            .constructor
            .as_ref()
            .ok_or_else(|| DIError::NotInstantiable {
                class: class.to_string(),
            })?;

        let owner = format!("{}::{}()", class, CONSTRUCTOR);
        let object = (constructor.build)(Arguments::new(owner, arguments))?;
        Ok(Instance::from_arc(class, object))
    }

    /// Call `method` on an instance, dispatching on the instance's own class
    pub fn call_method(&self, instance: &Instance, method: &str, arguments: Vec<Value>) -> DIResult<Value> {
        let class = instance.class_name();
        let definition = self.require(class)?;
        let target = definition
            .methods
            .get(method)
            .ok_or_else(|| DIError::BadMethodCall {
                class: class.to_string(),
                method: method.to_string(),
            })?;

        let owner = format!("{}::{}()", class, method);
        (target.call)(instance, Arguments::new(owner, arguments))
    }

    /// Whether `instance` was built as `class` or one of its subclasses
    pub fn is_instance_of(&self, instance: &Instance, class: &str) -> bool {
        self.is_subclass_or_same(instance.class_name(), class)
    }
}

impl TypeIntrospection for ClassRegistry {
    fn class_exists(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn is_subclass_or_same(&self, class: &str, parent: &str) -> bool {
        let mut pending = vec![class];
        let mut seen = HashSet::new();

        while let Some(current) = pending.pop() {
            if current == parent {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(definition) = self.classes.get(current) {
                pending.extend(definition.parents.iter().map(String::as_str));
            }
        }
        false
    }

    fn constructor_parameters(&self, class: &str) -> DIResult<Vec<Parameter>> {
        let definition = self.require(class)?;
        Ok(definition
            .constructor
            .as_ref()
            .map(|c| c.parameters.clone())
            .unwrap_or_default())
    }

    fn method_parameters(&self, class: &str, method: &str) -> DIResult<Vec<Parameter>> {
        if method == CONSTRUCTOR {
            return self.constructor_parameters(class);
        }
        let definition = self.require(class)?;
        definition
            .methods
            .get(method)
            .map(|m| m.parameters.clone())
            .ok_or_else(|| DIError::BadMethodCall {
                class: class.to_string(),
                method: method.to_string(),
            })
    }

    fn has_method(&self, class: &str, method: &str) -> bool {
        self.classes
            .get(class)
            .map(|definition| definition.has_method(method))
            .unwrap_or(false)
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}
