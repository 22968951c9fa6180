//! Storage trait definition.
//!
//! This module defines the [`Storage`] trait, the core abstraction for a
//! named, typed key/value collection ("cache"). All backends — in-memory,
//! relational-table-backed, or third-party — implement this trait, so the
//! application layer is decoupled from the persistence technology.
//!
//! # Design Philosophy
//!
//! - **Typed records**: a collection is homogeneous in one value type; the core treats it opaquely
//!   except for query attribute extraction.
//! - **Synchronous**: mutations, listener dispatch, and query execution complete on the calling
//!   thread before the operation returns.
//! - **Absent is not an error**: `get`/`remove` on a missing key return `Ok(None)`.
//! - **Observable**: registered listeners are invoked on create/update/remove mutations, in
//!   registration order, with a contractually fixed firing sequence (see [`Storage::put`]).
//!
//! Domain logic (what the records mean, how they serialize to a wire format)
//! lives above this trait; physical storage details live below it.
//!
//! # Implementing a Backend
//!
//! 1. Implement the [`Storage`] trait for your collection handle
//! 2. Supply a [`ValueSource`](crate::query::ValueSource) binding `query()` to your store
//! 3. Map backend-specific failures to [`StorageError`](crate::StorageError)
//!
//! See [`InMemoryStorage`](crate::InMemoryStorage) for the reference
//! implementation, including the full filter-condition enumeration.

use std::sync::Arc;

use crate::error::StorageResult;
use crate::query::Query;

/// Callback invoked with the new value on every `put` (insert or update).
pub type CreatedListener<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Callback invoked with the **previous** value when a `put` overwrites an
/// existing key.
pub type UpdatedListener<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Callback invoked with the key when `remove` drops a present entry.
pub type RemovedListener<K> = Arc<dyn Fn(&K) + Send + Sync>;

/// A named, typed key/value collection with change notification and
/// declarative queries.
///
/// Implementations are shared-mutable state: they must be `Send + Sync` and
/// serialize mutations so that listeners never observe a partially applied
/// write (see the crate-level concurrency notes).
///
/// # Key Operations
///
/// | Method | Description |
/// |--------|-------------|
/// | [`get`](Storage::get) | Retrieve a value by key |
/// | [`put`](Storage::put) | Insert or update, firing listeners |
/// | [`remove`](Storage::remove) | Remove a key, firing listeners |
/// | [`clear`](Storage::clear) | Listener-silent bulk removal |
/// | [`entries`](Storage::entries) | Snapshot of all pairs |
/// | [`query`](Storage::query) | Fresh filter/sort/offset/limit pipeline |
///
/// # Listener contract
///
/// Listener lists are append-only for the collection's lifetime; there is no
/// deregistration. Callbacks run synchronously on the mutating thread, in
/// registration order, **before** the mapping update completes. Downstream
/// consumers (e.g. change-data-capture emitters) depend on this ordering and
/// on the update listener receiving the previous value, so it is part of the
/// contract every backend must reproduce, not an implementation detail.
pub trait Storage<K, V>: Send + Sync {
    /// Retrieves the value stored under `key`. No side effects.
    ///
    /// Returns `Ok(None)` when the key is absent; that is not an error.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn get(&self, key: &K) -> StorageResult<Option<V>>;

    /// Whether `key` currently maps to a value.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn contains_key(&self, key: &K) -> StorageResult<bool>;

    /// Associates `key` with `value`, returning the previous value if any.
    ///
    /// Within one collection keys are unique: a `put` with an existing key is
    /// an update, not a second insert.
    ///
    /// # Listener firing sequence
    ///
    /// 1. If a previous value existed, every update listener fires with the **previous** value.
    /// 2. Every create listener fires with the **new** value — on every put, insert *and* update.
    /// 3. The mapping is updated.
    ///
    /// Step 2 firing unconditionally is deliberate and contractual.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn put(&self, key: K, value: V) -> StorageResult<Option<V>>;

    /// Removes `key`, returning the removed value if it was present.
    ///
    /// When the key is present, every remove listener fires with the key
    /// before removal. An absent key fires no listener and is not an error.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn remove(&self, key: &K) -> StorageResult<Option<V>>;

    /// Removes all entries. Fires no per-entry listener, by contract.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn clear(&self) -> StorageResult<()>;

    /// Snapshot of all (key, value) pairs.
    ///
    /// Ordering is unspecified; apply a query sort when order matters.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn entries(&self) -> StorageResult<Vec<(K, V)>>;

    /// Number of entries currently stored.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn len(&self) -> StorageResult<usize>;

    /// Whether the collection is empty.
    #[must_use = "storage operations may fail and errors must be handled"]
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Registers a callback for the create notification (see [`Storage::put`]).
    fn add_created_listener(&self, listener: CreatedListener<V>);

    /// Registers a callback for the update notification (see [`Storage::put`]).
    fn add_updated_listener(&self, listener: UpdatedListener<V>);

    /// Registers a callback for the remove notification (see [`Storage::remove`]).
    fn add_removed_listener(&self, listener: RemovedListener<K>);

    /// The root type tag identifying the logical value type of this
    /// collection's entries. Fixed at construction; not interpreted by the
    /// core.
    fn root_type(&self) -> &str;

    /// Returns a new query pipeline bound to this collection's current value
    /// set.
    #[must_use = "a query does nothing until execute() is called"]
    fn query(&self) -> Query<V>;
}
