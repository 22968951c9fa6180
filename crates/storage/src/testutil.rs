//! Shared test utilities for storage backend testing.
//!
//! This module provides a canonical test record type, cache population
//! helpers, and assertion macros for [`StorageResult`] values. It is
//! feature-gated behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cachestore-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use cachestore_storage::testutil::{populated_cache, record, TestRecord};
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::memory::InMemoryStorage;
use crate::storage::Storage;

/// Canonical record type for exercising the query pipeline.
///
/// Covers the attribute shapes filters are defined over: strings, numbers,
/// arrays, and an optional field for the null-check conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Unique record identifier.
    pub id: String,
    /// Workflow status, typically `"open"` or `"closed"`.
    pub status: String,
    /// Numeric attribute for range and comparison filters.
    pub amount: i64,
    /// Array attribute for the contains-family filters.
    pub tags: Vec<String>,
    /// Optional attribute for `IS_NULL` / `NOT_NULL`.
    pub assignee: Option<String>,
}

/// Creates a test record with the given id, status, and amount.
///
/// Tags default to the record's status; `assignee` is set for even amounts
/// and absent for odd ones, giving every populated cache a mix of null and
/// non-null attributes.
#[must_use]
pub fn record(id: &str, status: &str, amount: i64) -> TestRecord {
    TestRecord {
        id: id.to_owned(),
        status: status.to_owned(),
        amount,
        tags: vec![status.to_owned()],
        assignee: (amount % 2 == 0).then(|| format!("user-{amount}")),
    }
}

/// Creates an in-memory cache pre-populated with `count` records.
///
/// Record `i` has id `"r{i}"`, status alternating `"open"`/`"closed"`, and
/// amount `i`. Keys equal the record ids.
///
/// # Panics
///
/// Panics if any `put` fails (does not happen with `InMemoryStorage`).
#[must_use]
pub fn populated_cache(count: usize) -> InMemoryStorage<String, TestRecord> {
    let cache = InMemoryStorage::new("test-record");
    for i in 0..count {
        let status = if i % 2 == 0 { "open" } else { "closed" };
        #[allow(clippy::cast_possible_wrap)]
        let rec = record(&format!("r{i}"), status, i as i64);
        cache.put(rec.id.clone(), rec).expect("populate put failed");
    }
    cache
}

/// Returns whether a result is an [`StorageError::Unsupported`] error.
#[must_use]
pub fn is_unsupported<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(StorageError::Unsupported { .. }))
}

/// Returns whether a result is an [`StorageError::InvalidArgument`] error.
#[must_use]
pub fn is_invalid_argument<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(StorageError::InvalidArgument { .. }))
}

/// Asserts that a [`StorageResult`] is an `Unsupported` error naming the
/// given feature.
#[macro_export]
macro_rules! assert_unsupported {
    ($result:expr, $feature:expr) => {
        match $result {
            Err($crate::StorageError::Unsupported { feature }) => {
                assert_eq!(feature, $feature, "unexpected unsupported feature");
            },
            other => panic!("expected Unsupported({}), got {:?}", $feature, other),
        }
    };
}

/// Asserts that a [`StorageResult`] is an `InvalidArgument` error.
#[macro_export]
macro_rules! assert_invalid_argument {
    ($result:expr) => {
        match $result {
            Err($crate::StorageError::InvalidArgument { .. }) => {},
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn record_mixes_null_and_non_null_assignees() {
        assert!(record("a", "open", 2).assignee.is_some());
        assert!(record("b", "open", 3).assignee.is_none());
    }

    #[test]
    fn populated_cache_alternates_status() {
        let cache = populated_cache(4);
        assert_eq!(cache.len().unwrap(), 4);
        assert_eq!(cache.get(&"r0".into()).unwrap().unwrap().status, "open");
        assert_eq!(cache.get(&"r1".into()).unwrap().unwrap().status, "closed");
    }

    #[test]
    fn assertion_macros_accept_matching_errors() {
        let unsupported: StorageResult<()> = Err(StorageError::unsupported("sort"));
        assert_unsupported!(unsupported, "sort");
        assert!(is_unsupported::<()>(&Err(StorageError::unsupported("sort"))));

        let invalid: StorageResult<()> = Err(StorageError::invalid_argument("offset"));
        assert_invalid_argument!(invalid);
        assert!(is_invalid_argument::<()>(&Err(StorageError::invalid_argument("x"))));
    }
}
