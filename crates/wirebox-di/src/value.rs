//! Values stored in and produced by the container

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::DIResult;

/// Type-erased object built by a class constructor
pub type AnyObject = Arc<dyn Any + Send + Sync>;

/// A constructed object together with the class that built it
#[derive(Clone)]
pub struct Instance {
    class: Arc<str>,
    object: AnyObject,
}

impl Instance {
    /// Wrap a freshly built object
    pub fn new<T: Any + Send + Sync>(class: impl Into<String>, object: T) -> Self {
        Self::from_arc(class, Arc::new(object))
    }

    /// Wrap an already shared object
    pub fn from_arc(class: impl Into<String>, object: AnyObject) -> Self {
        let class: String = class.into();
        Self {
            class: Arc::from(class),
            object,
        }
    }

    /// Name of the class this instance was built as
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Shared handle to the concrete object, if it is a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    /// Borrow the concrete object, if it is a `T`
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Whether both handles point at the same object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.object) as *const (),
            Arc::as_ptr(&other.object) as *const (),
        )
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class)
            .field("object", &Arc::as_ptr(&self.object))
            .finish()
    }
}

type FactoryFn = dyn Fn() -> DIResult<Value> + Send + Sync;

/// A zero-argument callable producing a value on demand
#[derive(Clone)]
pub struct Factory(Arc<FactoryFn>);

impl Factory {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> DIResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    /// Invoke the factory
    pub fn call(&self) -> DIResult<Value> {
        (self.0)()
    }

    pub fn ptr_eq(&self, other: &Factory) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Factory")
            .field(&(Arc::as_ptr(&self.0) as *const ()))
            .finish()
    }
}

/// Anything that can be bound to, or resolved from, the container.
///
/// Only [`Value::Class`] ever refers to a class: a string that happens to
/// match a class name is plain data.
#[derive(Clone, Debug)]
pub enum Value {
    /// Plain data: null, booleans, numbers, strings, lists and maps
    Data(serde_json::Value),
    /// An object built by a registered class
    Object(Instance),
    /// A factory invoked each time the value is resolved
    Factory(Factory),
    /// A reference to a registered class, resolved by instantiation
    Class(String),
}

impl Value {
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    /// Reference to a registered class
    pub fn class(name: impl Into<String>) -> Self {
        Value::Class(name.into())
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> DIResult<Value> + Send + Sync + 'static,
    {
        Value::Factory(Factory::new(factory))
    }

    /// Wrap a plain Rust object as an instance of `class`
    pub fn object<T: Any + Send + Sync>(class: impl Into<String>, object: T) -> Self {
        Value::Object(Instance::new(class, object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Data(serde_json::Value::Null))
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_factory(&self) -> Option<&Factory> {
        match self {
            Value::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(serde_json::Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_data().and_then(serde_json::Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(serde_json::Value::as_bool)
    }

    /// Typed view of an object value
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_instance().and_then(Instance::downcast::<T>)
    }

    /// Short description used in error messages
    pub(crate) fn kind(&self) -> String {
        match self {
            Value::Data(serde_json::Value::Null) => "null".to_string(),
            Value::Data(_) => "data".to_string(),
            Value::Object(instance) => format!("instance of [{}]", instance.class_name()),
            Value::Factory(_) => "factory".to_string(),
            Value::Class(class) => format!("class [{}]", class),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Factory(a), Value::Factory(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a == b,
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(serde_json::Value::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(serde_json::Value::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(serde_json::Value::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Data(serde_json::Value::from(n))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Object(instance)
    }
}

impl From<Factory> for Value {
    fn from(factory: Factory) -> Self {
        Value::Factory(factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Model {
        id: u32,
    }

    #[test]
    fn test_data_compares_by_value() {
        assert_eq!(Value::from("string"), Value::from("string"));
        assert_eq!(Value::from(1), Value::from(json!(1)));
        assert_eq!(Value::from(json!([1, 2, 3])), Value::from(json!([1, 2, 3])));
        assert_ne!(Value::from("1"), Value::from(1));
        assert!(Value::null().is_null());
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = Instance::new("Tests\\Model", Model { id: 1 });
        let b = Instance::new("Tests\\Model", Model { id: 1 });

        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a.clone()), Value::from(b));

        let model = a.downcast::<Model>().unwrap();
        assert_eq!(model.id, 1);
        assert!(a.downcast::<String>().is_none());
        assert_eq!(a.class_name(), "Tests\\Model");
    }

    #[test]
    fn test_factory_is_invoked_on_call() {
        let factory = Factory::new(|| Ok(Value::from(42)));
        assert_eq!(factory.call().unwrap().as_i64(), Some(42));
        assert!(factory.ptr_eq(&factory.clone()));
        assert!(!factory.ptr_eq(&Factory::new(|| Ok(Value::null()))));
    }
}
