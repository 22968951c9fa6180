//! Conformance test suite for [`Storage`] and [`StorageService`]
//! implementations.
//!
//! This module provides generic check functions that validate whether an
//! implementation correctly satisfies the cross-backend contract. Every
//! backend — in-memory, relational-table-backed, or third-party — can run
//! the same suite to ensure the application layer observes identical
//! behavior regardless of physical storage.
//!
//! # Usage
//!
//! Enable the `testutil` feature and call each conformance function with a
//! fresh collection or registry:
//!
//! ```no_run
//! use cachestore_storage::{conformance, InMemoryStorage};
//!
//! #[test]
//! fn put_new_key_fires_create_only() {
//!     conformance::put_new_key_fires_create_only(&InMemoryStorage::new("test-record"));
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | Mutation | Net effect of put/remove/clear sequences |
//! | Notification | Listener firing order, payloads, and idempotence |
//! | Query | Pipeline stage semantics and determinism |
//! | Registry | Get-or-create idempotence keyed by name |

use std::sync::Arc;

use parking_lot::Mutex;

use crate::filter::{between, equal_to};
use crate::storage::{RemovedListener, Storage};
use crate::testutil::{record, TestRecord};
use crate::StorageService;

fn tagged_log(
    log: &Arc<Mutex<Vec<String>>>,
    tag: &'static str,
) -> Arc<dyn Fn(&TestRecord) + Send + Sync> {
    let log = Arc::clone(log);
    Arc::new(move |rec: &TestRecord| log.lock().push(format!("{tag}:{}", rec.id)))
}

// ============================================================================
// Mutation — net effect of put/remove/clear sequences
// ============================================================================

/// `contains_key` reflects exactly the net effect of a put/remove sequence.
pub fn contains_key_reflects_net_effect<S: Storage<String, TestRecord>>(storage: &S) {
    let key = "r1".to_owned();
    assert!(!storage.contains_key(&key).expect("contains_key"));

    storage.put(key.clone(), record("r1", "open", 1)).expect("put");
    assert!(storage.contains_key(&key).expect("contains_key after put"));

    storage.remove(&key).expect("remove");
    assert!(!storage.contains_key(&key).expect("contains_key after remove"));

    storage.put(key.clone(), record("r1", "closed", 2)).expect("re-put");
    assert!(storage.contains_key(&key).expect("contains_key after re-put"));
}

/// `put` on an existing key replaces the value and returns the previous one.
pub fn put_returns_previous_value<S: Storage<String, TestRecord>>(storage: &S) {
    let old = record("r1", "open", 1);
    let new = record("r1", "closed", 2);

    assert_eq!(storage.put("r1".into(), old.clone()).expect("insert"), None);
    assert_eq!(storage.put("r1".into(), new.clone()).expect("update"), Some(old));
    assert_eq!(storage.get(&"r1".into()).expect("get"), Some(new));
    assert_eq!(storage.len().expect("len"), 1, "update must not insert a second entry");
}

/// `get` and `remove` on an absent key report `Ok(None)`, never an error.
pub fn absent_key_is_not_an_error<S: Storage<String, TestRecord>>(storage: &S) {
    assert_eq!(storage.get(&"ghost".into()).expect("get"), None);
    assert_eq!(storage.remove(&"ghost".into()).expect("remove"), None);
}

/// `clear` empties the collection regardless of prior contents.
pub fn clear_empties_the_collection<S: Storage<String, TestRecord>>(storage: &S) {
    for i in 0..5 {
        let rec = record(&format!("r{i}"), "open", i);
        storage.put(rec.id.clone(), rec).expect("put");
    }
    storage.clear().expect("clear");
    assert!(storage.is_empty().expect("is_empty"));
    assert_eq!(storage.entries().expect("entries"), Vec::new());
}

// ============================================================================
// Notification — listener firing order, payloads, idempotence
// ============================================================================

/// A put on a fresh key fires zero update listeners and exactly one create
/// listener carrying the new value.
pub fn put_new_key_fires_create_only<S: Storage<String, TestRecord>>(storage: &S) {
    let log = Arc::new(Mutex::new(Vec::new()));
    storage.add_created_listener(tagged_log(&log, "created"));
    storage.add_updated_listener(tagged_log(&log, "updated"));

    storage.put("r1".into(), record("r1", "open", 1)).expect("put");
    assert_eq!(*log.lock(), vec!["created:r1"]);
}

/// A put over an existing key fires exactly one update listener with the
/// **previous** value, then one create listener with the new value, before
/// a subsequent get observes the new value.
pub fn put_existing_key_fires_update_then_create<S: Storage<String, TestRecord>>(storage: &S) {
    storage.put("r1".into(), record("old", "open", 1)).expect("insert");

    let log = Arc::new(Mutex::new(Vec::new()));
    storage.add_updated_listener(tagged_log(&log, "updated"));
    storage.add_created_listener(tagged_log(&log, "created"));

    storage.put("r1".into(), record("new", "open", 2)).expect("update");
    assert_eq!(*log.lock(), vec!["updated:old", "created:new"]);
    assert_eq!(storage.get(&"r1".into()).expect("get").expect("present").id, "new");
}

/// `remove` of a present key fires exactly one remove listener with the key;
/// an absent key fires none.
pub fn remove_fires_listener_only_when_present<S: Storage<String, TestRecord>>(storage: &S) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let listener: RemovedListener<String> = {
        let log = Arc::clone(&log);
        Arc::new(move |key: &String| log.lock().push(key.clone()))
    };
    storage.add_removed_listener(listener);

    storage.remove(&"ghost".into()).expect("remove absent");
    assert!(log.lock().is_empty(), "remove of an absent key must fire no listener");

    storage.put("r1".into(), record("r1", "open", 1)).expect("put");
    storage.remove(&"r1".into()).expect("remove present");
    assert_eq!(*log.lock(), vec!["r1"]);
}

/// `clear` fires no per-key listener regardless of prior contents.
pub fn clear_is_listener_silent<S: Storage<String, TestRecord>>(storage: &S) {
    let log = Arc::new(Mutex::new(Vec::new()));
    storage.add_created_listener(tagged_log(&log, "created"));
    storage.add_updated_listener(tagged_log(&log, "updated"));
    let removed: RemovedListener<String> = {
        let log = Arc::clone(&log);
        Arc::new(move |key: &String| log.lock().push(format!("removed:{key}")))
    };
    storage.add_removed_listener(removed);

    for i in 0..3 {
        let rec = record(&format!("r{i}"), "open", i);
        storage.put(rec.id.clone(), rec).expect("put");
    }
    log.lock().clear();

    storage.clear().expect("clear");
    assert!(log.lock().is_empty(), "clear must be listener-silent");
}

/// Listeners fire synchronously in registration order.
pub fn listeners_fire_in_registration_order<S: Storage<String, TestRecord>>(storage: &S) {
    let log = Arc::new(Mutex::new(Vec::new()));
    storage.add_created_listener(tagged_log(&log, "first"));
    storage.add_created_listener(tagged_log(&log, "second"));
    storage.add_created_listener(tagged_log(&log, "third"));

    storage.put("r1".into(), record("r1", "open", 1)).expect("put");
    assert_eq!(*log.lock(), vec!["first:r1", "second:r1", "third:r1"]);
}

// ============================================================================
// Query — pipeline stage semantics and determinism
// ============================================================================

/// `offset(1).limit(1)` over a three-record collection yields a single
/// element of the unfiltered set, deterministically across repeated calls
/// with no intervening mutation.
pub fn query_offset_limit_is_deterministic<S: Storage<String, TestRecord>>(storage: &S) {
    for (key, id) in [("1", "a"), ("2", "b"), ("3", "c")] {
        storage.put(key.to_owned(), record(id, "open", 0)).expect("put");
    }

    let first = storage.query().offset(1).limit(1).execute().expect("execute");
    assert_eq!(first.len(), 1);
    assert!(["a", "b", "c"].contains(&first[0].id.as_str()));

    let second = storage.query().offset(1).limit(1).execute().expect("re-execute");
    assert_eq!(first, second, "repeated execution must be deterministic");
}

/// An EQUAL filter returns exactly the matching subset, order preserved
/// from the pre-filter sequence.
pub fn equal_filter_returns_exact_subset<S: Storage<String, TestRecord>>(storage: &S) {
    for (id, status) in [("r1", "open"), ("r2", "closed"), ("r3", "open"), ("r4", "closed")] {
        storage.put(id.to_owned(), record(id, status, 0)).expect("put");
    }

    let unfiltered = storage.query().execute().expect("unfiltered");
    let expected: Vec<&str> =
        unfiltered.iter().filter(|r| r.status == "open").map(|r| r.id.as_str()).collect();

    let open = storage
        .query()
        .filter(vec![equal_to("status", "open")])
        .execute()
        .expect("filtered");
    let got: Vec<&str> = open.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(got, expected);
}

/// A BETWEEN filter on a numeric attribute includes both endpoints and
/// excludes values just outside them.
pub fn between_filter_includes_endpoints<S: Storage<String, TestRecord>>(storage: &S) {
    for amount in [9, 10, 15, 20, 21] {
        let rec = record(&format!("r{amount}"), "open", amount);
        storage.put(rec.id.clone(), rec).expect("put");
    }

    let mut amounts: Vec<i64> = storage
        .query()
        .filter(vec![between("amount", 10, 20)])
        .execute()
        .expect("execute")
        .iter()
        .map(|r| r.amount)
        .collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![10, 15, 20]);
}

/// The offset-beyond-length policy (reject) is applied consistently across
/// repeated calls.
pub fn offset_beyond_length_policy_is_consistent<S: Storage<String, TestRecord>>(storage: &S) {
    storage.put("r1".into(), record("r1", "open", 1)).expect("put");

    for _ in 0..3 {
        let result = storage.query().offset(2).execute();
        assert!(
            crate::testutil::is_invalid_argument(&result),
            "offset beyond length must be rejected every time: {result:?}"
        );
    }
}

// ============================================================================
// Registry — get-or-create idempotence keyed by name
// ============================================================================

/// Two lookups with the same name return the same collection: a mutation
/// through one handle is visible through the other.
pub fn registry_lookup_is_idempotent<S: StorageService>(service: &S) {
    let first = service.get_cache("orders").expect("first lookup");
    let second = service.get_cache("orders").expect("second lookup");

    first.put("o1".into(), "pending".into()).expect("put");
    assert_eq!(second.get(&"o1".into()).expect("get"), Some("pending".into()));

    second.remove(&"o1".into()).expect("remove");
    assert_eq!(first.get(&"o1".into()).expect("get after remove"), None);
}

/// Collections created under different names are independent.
pub fn registry_names_are_independent<S: StorageService>(service: &S) {
    let orders = service.get_cache("orders").expect("orders");
    let users = service.get_cache("users").expect("users");

    orders.put("k".into(), "v".into()).expect("put");
    assert_eq!(users.get(&"k".into()).expect("get"), None);
    assert!(users.is_empty().expect("is_empty"));
}
