//! Ordered key/value storage
//!
//! Provides the `Store` trait the container talks to and a thread-safe,
//! insertion-ordered implementation behind a `parking_lot::RwLock`.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// String-keyed storage used by the container for its bindings.
///
/// Implementations must never hold a lock after a method returns; callers
/// re-enter the store while resolving nested services.
pub trait Store<V>: Send + Sync {
    /// Insert or replace a value, returning the previous one
    fn put(&self, key: String, value: V) -> Option<V>;

    /// Insert only when the key is absent. Returns `false` if it was present.
    fn add(&self, key: String, value: V) -> bool;

    /// Get a value by key (cloned)
    fn get(&self, key: &str) -> Option<V>;

    /// Check if key exists
    fn has(&self, key: &str) -> bool;

    /// Remove a value by key. Returns `false` if nothing was removed.
    fn delete(&self, key: &str) -> bool;

    /// Get the number of entries
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All keys in insertion order
    fn keys(&self) -> Vec<String>;

    /// Clear all entries
    fn clear(&self);
}

/// Insertion-ordered map implementing [`Store`]
pub struct OrderedStore<V> {
    inner: RwLock<IndexMap<String, V>>,
}

impl<V> OrderedStore<V>
where
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IndexMap::new()),
        }
    }
}

impl<V> Default for OrderedStore<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Store<V> for OrderedStore<V>
where
    V: Clone + Send + Sync,
{
    fn put(&self, key: String, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    fn add(&self, key: String, value: V) -> bool {
        let mut map = self.inner.write();
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, value);
        true
    }

    fn get(&self, key: &str) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    fn has(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    fn delete(&self, key: &str) -> bool {
        // shift_remove keeps the remaining keys in insertion order
        self.inner.write().shift_remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.inner.read().len()
    }

    fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    fn clear(&self) {
        self.inner.write().clear();
    }
}

/// Arc-wrapped store for shared ownership
pub type SharedStore<V> = Arc<dyn Store<V>>;

/// Create a new shared, ordered store
pub fn shared_store<V>() -> SharedStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    Arc::new(OrderedStore::new())
}
