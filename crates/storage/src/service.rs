//! Process-wide cache registry.
//!
//! [`StorageService`] maps collection names to [`Storage`] instances, lazily
//! creating a collection on first lookup and returning the **same** instance
//! for every subsequent lookup with that name. The registry is an owned
//! value with an explicit lifecycle — created at process start, dropped at
//! process stop — not ambient global state.
//!
//! # Idempotence
//!
//! All lookups are idempotent keyed purely by name. A second call with the
//! same name returns the previously created collection unchanged, even when
//! the caller supplies a different root-type tag: the tag recorded at first
//! creation wins. This first-writer-wins rule is contractual.
//!
//! One consequence of typed collections: a second lookup must request the
//! same Rust value type the collection was created with. A lookup with a
//! different type cannot return the original instance and fails with
//! [`TypeMismatch`](crate::StorageError::TypeMismatch).
//!
//! # Example
//!
//! ```
//! use cachestore_storage::{InMemoryStorageService, Storage, StorageService};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = InMemoryStorageService::new();
//!
//! let orders = service.get_cache("orders")?;
//! orders.put("o1".into(), "pending".into())?;
//!
//! // Same name, same collection: the entry is visible through both handles.
//! let again = service.get_cache("orders")?;
//! assert_eq!(again.get(&"o1".into())?, Some("pending".into()));
//! # Ok(())
//! # }
//! ```

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::memory::InMemoryStorage;
use crate::storage::Storage;

/// Root type tag used for plain string caches.
pub const STRING_ROOT_TYPE: &str = "string";

/// Marker trait for types storable through the registry.
///
/// Blanket-implemented for every type that is cloneable, serializable (for
/// query attribute extraction), and shareable across threads.
pub trait CacheValue: Clone + Serialize + Send + Sync + 'static {}

impl<T: Clone + Serialize + Send + Sync + 'static> CacheValue for T {}

/// Registry of named, typed collections.
///
/// All three lookups are get-or-create, atomic per name: concurrent
/// first-time lookups for one name observe exactly one created collection.
pub trait StorageService: Send + Sync {
    /// Returns the collection for `name` typed to plain string values,
    /// creating it with root type [`STRING_ROOT_TYPE`] on first call.
    fn get_cache(&self, name: &str) -> StorageResult<Arc<dyn Storage<String, String>>>;

    /// Returns the collection for `name` typed to `T`, creating it on first
    /// call with a root type derived from `T`'s type name.
    fn get_cache_typed<T: CacheValue>(
        &self,
        name: &str,
    ) -> StorageResult<Arc<dyn Storage<String, T>>>;

    /// Returns the collection for `name` typed to `T`, creating it on first
    /// call with the explicitly supplied root-type tag instead of one
    /// derived from `T`.
    fn get_cache_with_data_format<T: CacheValue>(
        &self,
        name: &str,
        root_type: &str,
    ) -> StorageResult<Arc<dyn Storage<String, T>>>;
}

/// In-memory [`StorageService`] implementation.
///
/// Backs every collection with an [`InMemoryStorage`]. The name→collection
/// map is guarded by a [`parking_lot::Mutex`], making get-or-create atomic.
/// Collections are stored type-erased; the root type recorded at creation
/// lives in the collection itself.
#[derive(Default)]
pub struct InMemoryStorageService {
    caches: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl InMemoryStorageService {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic get-or-create, keyed purely by `name`.
    ///
    /// `root_type` is recorded only when the collection is created here;
    /// a pre-existing collection keeps whatever tag it was created with.
    fn get_or_create<T: CacheValue>(
        &self,
        name: &str,
        root_type: &str,
    ) -> StorageResult<Arc<InMemoryStorage<String, T>>> {
        let mut caches = self.caches.lock();
        let entry = caches.entry(name.to_owned()).or_insert_with(|| {
            debug!(name, root_type, "created cache");
            Arc::new(InMemoryStorage::<String, T>::new(root_type))
        });

        Arc::clone(entry)
            .downcast::<InMemoryStorage<String, T>>()
            .map_err(|_| StorageError::type_mismatch(name, type_name::<T>()))
    }
}

impl StorageService for InMemoryStorageService {
    fn get_cache(&self, name: &str) -> StorageResult<Arc<dyn Storage<String, String>>> {
        Ok(self.get_or_create::<String>(name, STRING_ROOT_TYPE)?)
    }

    fn get_cache_typed<T: CacheValue>(
        &self,
        name: &str,
    ) -> StorageResult<Arc<dyn Storage<String, T>>> {
        Ok(self.get_or_create::<T>(name, type_name::<T>())?)
    }

    fn get_cache_with_data_format<T: CacheValue>(
        &self,
        name: &str,
        root_type: &str,
    ) -> StorageResult<Arc<dyn Storage<String, T>>> {
        Ok(self.get_or_create::<T>(name, root_type)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        amount: i64,
    }

    #[test]
    fn repeated_lookup_returns_the_same_collection() {
        let service = InMemoryStorageService::new();

        let first = service.get_cache("orders").unwrap();
        let second = service.get_cache("orders").unwrap();

        first.put("o1".into(), "pending".into()).unwrap();
        assert_eq!(second.get(&"o1".into()).unwrap(), Some("pending".into()));
    }

    #[test]
    fn distinct_names_get_distinct_collections() {
        let service = InMemoryStorageService::new();

        let orders = service.get_cache("orders").unwrap();
        let users = service.get_cache("users").unwrap();

        orders.put("k".into(), "order".into()).unwrap();
        assert_eq!(users.get(&"k".into()).unwrap(), None);
    }

    #[test]
    fn string_cache_uses_string_root_type() {
        let service = InMemoryStorageService::new();
        let cache = service.get_cache("plain").unwrap();
        assert_eq!(cache.root_type(), STRING_ROOT_TYPE);
    }

    #[test]
    fn typed_cache_derives_root_type_from_the_type() {
        let service = InMemoryStorageService::new();
        let cache = service.get_cache_typed::<Order>("orders").unwrap();
        assert!(cache.root_type().ends_with("Order"), "got {}", cache.root_type());
    }

    #[test]
    fn explicit_data_format_overrides_the_derived_tag() {
        let service = InMemoryStorageService::new();
        let cache =
            service.get_cache_with_data_format::<Order>("orders", "com.example.Order").unwrap();
        assert_eq!(cache.root_type(), "com.example.Order");
    }

    #[test]
    fn first_writer_wins_on_root_type() {
        let service = InMemoryStorageService::new();

        let first =
            service.get_cache_with_data_format::<Order>("orders", "com.example.Order").unwrap();
        let second =
            service.get_cache_with_data_format::<Order>("orders", "something.else").unwrap();

        // Same collection, and the tag recorded at creation is kept.
        assert_eq!(first.root_type(), "com.example.Order");
        assert_eq!(second.root_type(), "com.example.Order");
        first.put("o1".into(), Order { amount: 1 }).unwrap();
        assert_eq!(second.get(&"o1".into()).unwrap(), Some(Order { amount: 1 }));
    }

    #[test]
    fn lookup_with_a_different_value_type_fails() {
        let service = InMemoryStorageService::new();
        service.get_cache_typed::<Order>("orders").unwrap();

        let err = service.get_cache("orders").err().unwrap();
        assert!(matches!(err, StorageError::TypeMismatch { .. }), "got {err:?}");
    }

    #[test]
    fn concurrent_first_lookups_create_exactly_one_collection() {
        let service = Arc::new(InMemoryStorageService::new());

        let mut handles = Vec::new();
        for task in 0..8 {
            let service = Arc::clone(&service);
            handles.push(std::thread::spawn(move || {
                let cache = service.get_cache("shared").unwrap();
                cache.put(format!("k{task}"), "v".into()).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Every thread wrote into the same collection.
        let cache = service.get_cache("shared").unwrap();
        assert_eq!(cache.len().unwrap(), 8);
    }
}
