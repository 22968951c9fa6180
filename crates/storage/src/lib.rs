//! Backend-agnostic named-cache storage abstraction.
//!
//! This crate provides the [`Storage`] trait and related types used to
//! persist and query typed records under named logical collections
//! ("caches"). Callers obtain a collection from a [`StorageService`],
//! perform create/update/remove/get operations on it, observe changes
//! through synchronous listeners, and run declarative queries
//! (filter, sort, offset, limit) over its contents. Multiple backends
//! implement the same contract, so the application layer is decoupled from
//! the persistence technology.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                         │
//! │        (domain repositories, change-data-capture)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   StorageService                            │
//! │        name → Storage registry (get-or-create)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      Storage                                │
//! │  get / put / remove / clear / listeners / query()           │
//! ├──────────────────┬──────────────────────────────────────────┤
//! │ InMemoryStorage  │        relational backends               │
//! │  (reference)     │        (separate crates)                 │
//! └──────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use cachestore_storage::filter::{equal_to, sort_by, SortDirection};
//! use cachestore_storage::{InMemoryStorageService, Storage, StorageService};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Order {
//!     status: String,
//!     amount: i64,
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = InMemoryStorageService::new();
//!     let orders = service.get_cache_typed::<Order>("orders")?;
//!
//!     orders.put("o1".into(), Order { status: "open".into(), amount: 12 })?;
//!     orders.put("o2".into(), Order { status: "closed".into(), amount: 7 })?;
//!
//!     let open = orders
//!         .query()
//!         .filter(vec![equal_to("status", "open")])
//!         .sort(vec![sort_by("amount", SortDirection::Ascending)])
//!         .execute()?;
//!     assert_eq!(open.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! # Change notification
//!
//! Each collection owns three append-only listener lists. Callbacks run
//! synchronously on the mutating thread, in registration order, before the
//! write lands; the update listener receives the **previous** value and the
//! create listener fires on every put, insert or update. See
//! [`Storage::put`] for the full contract.
//!
//! # Concurrency
//!
//! There is no internal threading: mutations, listener dispatch, and query
//! execution complete on the calling thread. Collections and the registry
//! are `Send + Sync` shared-mutable state; mutations on one collection
//! serialize, and registry get-or-create is atomic per name. Queries racing
//! with mutations see each value that existed at some point during
//! `execute()` — no snapshot isolation is promised.
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`]. A missing key is reported as
//! `Ok(None)`, not an error; see [`StorageError`] for the failure taxonomy.
//!
//! # Implementing a Backend
//!
//! 1. Implement the [`Storage`] trait for your collection handle
//! 2. Bind `query()` to your store through a [`ValueSource`], overriding its capability methods
//!    for any filter condition or sort you cannot evaluate
//! 3. Map backend-specific failures to [`StorageError::Backend`]
//!
//! See the [`memory`] module source for the reference implementation.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module (record generators, assertion macros) and the
//!   `conformance` suite of generic contract checks. Enable this in `[dev-dependencies]` for
//!   integration tests.

#![deny(unsafe_code)]

#[cfg(any(test, feature = "testutil"))]
pub mod conformance;
pub mod error;
pub mod filter;
pub mod memory;
pub mod query;
pub mod service;
pub mod storage;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;

// Re-export primary types at crate root for convenience
pub use error::{BoxError, StorageError, StorageResult};
pub use filter::{AttributeFilter, AttributeSort, FilterCondition, SortDirection};
pub use memory::InMemoryStorage;
pub use query::{Query, ValueSource};
pub use service::{CacheValue, InMemoryStorageService, StorageService, STRING_ROOT_TYPE};
pub use storage::{CreatedListener, RemovedListener, Storage, UpdatedListener};
