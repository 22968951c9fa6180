//! In-memory storage backend implementation.
//!
//! This module provides [`InMemoryStorage`], an in-memory implementation of
//! [`Storage`] backed by a [`BTreeMap`]. It is the reference implementation
//! of the contract, including the full filter-condition enumeration and the
//! sort stage of the query pipeline.
//!
//! # Features
//!
//! - **Thread-safe**: data behind [`parking_lot::RwLock`], mutations serialized by a dedicated lock
//! - **Deterministic iteration**: keys are stored in a [`BTreeMap`], so repeated queries with no
//!   intervening mutation see the same order
//! - **Synchronous notifications**: listeners fire on the mutating thread, before the write lands
//!
//! # Example
//!
//! ```
//! use cachestore_storage::{InMemoryStorage, Storage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = InMemoryStorage::<String, String>::new("string");
//! cache.put("greeting".into(), "hello".into())?;
//! assert_eq!(cache.get(&"greeting".into())?, Some("hello".into()));
//! # Ok(())
//! # }
//! ```
//!
//! # Listener reentrancy
//!
//! Listeners may read the collection that notified them, but must not mutate
//! it: mutations are serialized by a non-reentrant lock, so a listener
//! calling `put`/`remove`/`clear` on its own collection deadlocks. Mutating
//! a *different* collection from a listener is fine.
//!
//! # Limitations
//!
//! - Data is not persisted; all entries are lost when the process exits
//! - No replication or distributed features

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::error::StorageResult;
use crate::query::{Query, ValueSource};
use crate::storage::{CreatedListener, RemovedListener, Storage, UpdatedListener};

/// Shared state of one in-memory collection.
///
/// The `mutation` lock serializes `put`/`remove`/`clear` together with their
/// listener dispatch. The `data` lock is held only for the map access itself,
/// never across a callback, so listeners can read the collection.
struct Inner<K, V> {
    data: RwLock<BTreeMap<K, V>>,
    mutation: Mutex<()>,
    created_listeners: RwLock<Vec<CreatedListener<V>>>,
    updated_listeners: RwLock<Vec<UpdatedListener<V>>>,
    removed_listeners: RwLock<Vec<RemovedListener<K>>>,
    root_type: String,
}

/// In-memory [`Storage`] implementation using [`BTreeMap`].
///
/// Primarily intended for testing and development, but also serves as the
/// reference for the cross-backend contract: listener firing order, the
/// full filter enumeration, and sort are all implemented here.
///
/// # Cloning
///
/// `InMemoryStorage` is cheaply cloneable via [`Arc`]. All clones share the
/// same underlying collection, so a mutation through one handle is visible
/// through every other.
pub struct InMemoryStorage<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for InMemoryStorage<K, V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K, V> InMemoryStorage<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Serialize + Send + Sync + 'static,
{
    /// Creates an empty collection tagged with the given root type.
    pub fn new(root_type: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(BTreeMap::new()),
                mutation: Mutex::new(()),
                created_listeners: RwLock::new(Vec::new()),
                updated_listeners: RwLock::new(Vec::new()),
                removed_listeners: RwLock::new(Vec::new()),
                root_type: root_type.into(),
            }),
        }
    }
}

impl<K, V> ValueSource<V> for Inner<K, V>
where
    K: Ord + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn values(&self) -> StorageResult<Vec<V>> {
        Ok(self.data.read().values().cloned().collect())
    }
}

impl<K, V> Storage<K, V> for InMemoryStorage<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Clone + Serialize + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> StorageResult<Option<V>> {
        Ok(self.inner.data.read().get(key).cloned())
    }

    fn contains_key(&self, key: &K) -> StorageResult<bool> {
        Ok(self.inner.data.read().contains_key(key))
    }

    fn put(&self, key: K, value: V) -> StorageResult<Option<V>> {
        let _mutation = self.inner.mutation.lock();

        let previous = self.inner.data.read().get(&key).cloned();

        // Clone the listener lists out so no lock is held across a callback;
        // a listener registering another listener stays deadlock-free.
        if let Some(prev) = &previous {
            let listeners = self.inner.updated_listeners.read().clone();
            for listener in &listeners {
                listener(prev);
            }
        }
        let listeners = self.inner.created_listeners.read().clone();
        for listener in &listeners {
            listener(&value);
        }

        self.inner.data.write().insert(key, value);
        Ok(previous)
    }

    fn remove(&self, key: &K) -> StorageResult<Option<V>> {
        let _mutation = self.inner.mutation.lock();

        if self.inner.data.read().contains_key(key) {
            let listeners = self.inner.removed_listeners.read().clone();
            for listener in &listeners {
                listener(key);
            }
        }

        Ok(self.inner.data.write().remove(key))
    }

    fn clear(&self) -> StorageResult<()> {
        let _mutation = self.inner.mutation.lock();
        self.inner.data.write().clear();
        Ok(())
    }

    fn entries(&self) -> StorageResult<Vec<(K, V)>> {
        Ok(self.inner.data.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.inner.data.read().len())
    }

    fn add_created_listener(&self, listener: CreatedListener<V>) {
        self.inner.created_listeners.write().push(listener);
    }

    fn add_updated_listener(&self, listener: UpdatedListener<V>) {
        self.inner.updated_listeners.write().push(listener);
    }

    fn add_removed_listener(&self, listener: RemovedListener<K>) {
        self.inner.removed_listeners.write().push(listener);
    }

    fn root_type(&self) -> &str {
        &self.inner.root_type
    }

    fn query(&self) -> Query<V> {
        Query::new(Arc::clone(&self.inner) as Arc<dyn ValueSource<V>>)
    }
}
