//! Conformance test suite for `InMemoryStorage` and `InMemoryStorageService`.
//!
//! Each test function corresponds to a single conformance check, providing
//! fine-grained failure reporting. Backends outside this crate run the same
//! functions against their own implementations.

#![allow(clippy::expect_used, clippy::panic)]

use cachestore_storage::testutil::TestRecord;
use cachestore_storage::{conformance, InMemoryStorage, InMemoryStorageService};

fn fresh() -> InMemoryStorage<String, TestRecord> {
    InMemoryStorage::new("test-record")
}

// ============================================================================
// Mutation
// ============================================================================

#[test]
fn contains_key_reflects_net_effect() {
    conformance::contains_key_reflects_net_effect(&fresh());
}

#[test]
fn put_returns_previous_value() {
    conformance::put_returns_previous_value(&fresh());
}

#[test]
fn absent_key_is_not_an_error() {
    conformance::absent_key_is_not_an_error(&fresh());
}

#[test]
fn clear_empties_the_collection() {
    conformance::clear_empties_the_collection(&fresh());
}

// ============================================================================
// Notification
// ============================================================================

#[test]
fn put_new_key_fires_create_only() {
    conformance::put_new_key_fires_create_only(&fresh());
}

#[test]
fn put_existing_key_fires_update_then_create() {
    conformance::put_existing_key_fires_update_then_create(&fresh());
}

#[test]
fn remove_fires_listener_only_when_present() {
    conformance::remove_fires_listener_only_when_present(&fresh());
}

#[test]
fn clear_is_listener_silent() {
    conformance::clear_is_listener_silent(&fresh());
}

#[test]
fn listeners_fire_in_registration_order() {
    conformance::listeners_fire_in_registration_order(&fresh());
}

// ============================================================================
// Query
// ============================================================================

#[test]
fn query_offset_limit_is_deterministic() {
    conformance::query_offset_limit_is_deterministic(&fresh());
}

#[test]
fn equal_filter_returns_exact_subset() {
    conformance::equal_filter_returns_exact_subset(&fresh());
}

#[test]
fn between_filter_includes_endpoints() {
    conformance::between_filter_includes_endpoints(&fresh());
}

#[test]
fn offset_beyond_length_policy_is_consistent() {
    conformance::offset_beyond_length_policy_is_consistent(&fresh());
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn registry_lookup_is_idempotent() {
    conformance::registry_lookup_is_idempotent(&InMemoryStorageService::new());
}

#[test]
fn registry_names_are_independent() {
    conformance::registry_names_are_independent(&InMemoryStorageService::new());
}
