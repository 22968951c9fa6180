//! End-to-end query pipeline tests over the in-memory backend.
//!
//! Exercises every filter condition of the cross-backend enumeration against
//! typed records, plus sort, offset, and limit interactions and the
//! unsupported-feature failure shape of a deliberately partial backend.

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use cachestore_storage::filter::{
    and, between, contains, contains_all, contains_any, equal_to, greater_than,
    greater_than_equal, is_in, is_null, less_than, less_than_equal, like, not_null, or, sort_by,
    SortDirection,
};
use cachestore_storage::testutil::TestRecord;
use cachestore_storage::{
    assert_invalid_argument, assert_unsupported, AttributeFilter, FilterCondition, InMemoryStorage,
    Query, Storage, StorageError, StorageResult, ValueSource,
};

fn sample_cache() -> InMemoryStorage<String, TestRecord> {
    let cache = InMemoryStorage::new("test-record");
    let records = [
        TestRecord {
            id: "r1".into(),
            status: "open".into(),
            amount: 9,
            tags: vec!["red".into()],
            assignee: None,
        },
        TestRecord {
            id: "r2".into(),
            status: "open".into(),
            amount: 10,
            tags: vec!["red".into(), "urgent".into()],
            assignee: Some("alice".into()),
        },
        TestRecord {
            id: "r3".into(),
            status: "closed".into(),
            amount: 15,
            tags: vec!["blue".into()],
            assignee: Some("bob".into()),
        },
        TestRecord {
            id: "r4".into(),
            status: "open".into(),
            amount: 20,
            tags: vec!["red".into(), "blue".into()],
            assignee: None,
        },
        TestRecord {
            id: "r5".into(),
            status: "archived".into(),
            amount: 21,
            tags: vec![],
            assignee: Some("alice".into()),
        },
    ];
    for rec in records {
        cache.put(rec.id.clone(), rec).expect("put");
    }
    cache
}

fn ids(records: &[TestRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

fn run(cache: &InMemoryStorage<String, TestRecord>, filters: Vec<AttributeFilter>) -> Vec<String> {
    cache
        .query()
        .filter(filters)
        .execute()
        .expect("execute")
        .iter()
        .map(|r| r.id.clone())
        .collect()
}

// ============================================================================
// Filter conditions (keys are stored in order r1..r5)
// ============================================================================

#[test]
fn equal_filter() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![equal_to("status", "closed")]), ["r3"]);
}

#[test]
fn contains_filter_on_array_and_string() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![contains("tags", "blue")]), ["r3", "r4"]);
    assert_eq!(run(&cache, vec![contains("status", "archi")]), ["r5"]);
}

#[test]
fn contains_all_filter() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![contains_all("tags", ["red", "blue"])]), ["r4"]);
}

#[test]
fn contains_any_filter() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![contains_any("tags", ["urgent", "blue"])]), ["r2", "r3", "r4"]);
}

#[test]
fn like_filter() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![like("status", "*ose*")]), ["r3"]);
    assert_eq!(run(&cache, vec![like("id", "r*")]).len(), 5);
}

#[test]
fn in_filter() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![is_in("amount", [9, 21])]), ["r1", "r5"]);
}

#[test]
fn null_filters() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![is_null("assignee")]), ["r1", "r4"]);
    assert_eq!(run(&cache, vec![not_null("assignee")]), ["r2", "r3", "r5"]);
}

#[test]
fn between_filter_includes_endpoints_excludes_neighbours() {
    let cache = sample_cache();
    // 9 and 21 sit just outside the range; 10 and 20 are the endpoints.
    assert_eq!(run(&cache, vec![between("amount", 10, 20)]), ["r2", "r3", "r4"]);
}

#[test]
fn comparison_filters() {
    let cache = sample_cache();
    assert_eq!(run(&cache, vec![greater_than("amount", 15)]), ["r4", "r5"]);
    assert_eq!(run(&cache, vec![greater_than_equal("amount", 15)]), ["r3", "r4", "r5"]);
    assert_eq!(run(&cache, vec![less_than("amount", 10)]), ["r1"]);
    assert_eq!(run(&cache, vec![less_than_equal("amount", 10)]), ["r1", "r2"]);
}

#[test]
fn nested_and_or_filters() {
    let cache = sample_cache();
    let filter = or(vec![
        and(vec![equal_to("status", "open"), greater_than("amount", 9)]),
        equal_to("status", "archived"),
    ]);
    assert_eq!(run(&cache, vec![filter]), ["r2", "r4", "r5"]);
}

#[test]
fn filter_list_is_a_conjunction() {
    let cache = sample_cache();
    assert_eq!(
        run(&cache, vec![equal_to("status", "open"), contains("tags", "red"), is_null("assignee")]),
        ["r1", "r4"]
    );
}

// ============================================================================
// Sort, offset, limit
// ============================================================================

#[test]
fn sort_descending_by_amount() {
    let cache = sample_cache();
    let results = cache
        .query()
        .sort(vec![sort_by("amount", SortDirection::Descending)])
        .execute()
        .expect("execute");
    assert_eq!(ids(&results), ["r5", "r4", "r3", "r2", "r1"]);
}

#[test]
fn sort_by_string_then_number() {
    let cache = sample_cache();
    let results = cache
        .query()
        .sort(vec![
            sort_by("status", SortDirection::Ascending),
            sort_by("amount", SortDirection::Descending),
        ])
        .execute()
        .expect("execute");
    // archived < closed < open; opens fall back to amount descending.
    assert_eq!(ids(&results), ["r5", "r3", "r4", "r2", "r1"]);
}

#[test]
fn full_pipeline_filter_sort_window() {
    let cache = sample_cache();
    let results = cache
        .query()
        .filter(vec![equal_to("status", "open")])
        .sort(vec![sort_by("amount", SortDirection::Ascending)])
        .offset(1)
        .limit(1)
        .execute()
        .expect("execute");
    assert_eq!(ids(&results), ["r2"]);
}

#[test]
fn offset_beyond_filtered_length_is_rejected() {
    let cache = sample_cache();
    let result = cache.query().filter(vec![equal_to("status", "closed")]).offset(2).execute();
    assert_invalid_argument!(result);
}

#[test]
fn mutations_between_executes_are_observed() {
    let cache = sample_cache();
    let query = cache.query().filter(vec![equal_to("status", "open")]);

    assert_eq!(query.execute().expect("first").len(), 3);

    cache.remove(&"r2".into()).expect("remove");
    assert_eq!(query.execute().expect("second").len(), 2);
}

// ============================================================================
// Serialization failures
// ============================================================================

/// A record type whose encoding fails for one variant, standing in for a
/// broken `Serialize` impl in application code.
#[derive(Clone)]
enum FlakyRecord {
    Plain(i64),
    Unencodable,
}

impl serde::Serialize for FlakyRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Plain(n) => serializer.serialize_i64(*n),
            Self::Unencodable => Err(serde::ser::Error::custom("record cannot be encoded")),
        }
    }
}

#[test]
fn unencodable_candidate_fails_without_partial_results() {
    let cache: InMemoryStorage<String, FlakyRecord> = InMemoryStorage::new("flaky");
    cache.put("good".into(), FlakyRecord::Plain(1)).expect("put");
    cache.put("bad".into(), FlakyRecord::Unencodable).expect("put");

    // The encodable record matches the filter, but one failing candidate
    // must fail the whole execute, never a partial result set.
    let result = cache.query().filter(vec![equal_to("n", 1)]).execute();
    assert!(
        matches!(result, Err(StorageError::Serialization { .. })),
        "expected a Serialization error"
    );
}

// ============================================================================
// Unsupported-feature reporting
// ============================================================================

/// A value source that pushes nothing down and declines everything beyond
/// equality, standing in for a constrained physical backend.
struct EqualityOnlySource {
    records: Vec<TestRecord>,
}

impl ValueSource<TestRecord> for EqualityOnlySource {
    fn values(&self) -> StorageResult<Vec<TestRecord>> {
        Ok(self.records.clone())
    }

    fn supports_condition(&self, condition: &FilterCondition) -> bool {
        matches!(condition, FilterCondition::Equal(_))
    }

    fn supports_sort(&self) -> bool {
        false
    }
}

fn equality_only_query() -> Query<TestRecord> {
    let records = sample_cache().query().execute().expect("seed records");
    Query::new(Arc::new(EqualityOnlySource { records }))
}

#[test]
fn declined_condition_fails_naming_the_condition() {
    let result = equality_only_query().filter(vec![between("amount", 10, 20)]).execute();
    assert_unsupported!(result, "filter: BETWEEN");
}

#[test]
fn declined_sort_fails_naming_sort() {
    let result =
        equality_only_query().sort(vec![sort_by("amount", SortDirection::Ascending)]).execute();
    assert_unsupported!(result, "sort");
}

#[test]
fn declined_condition_never_returns_partial_results() {
    // EQUAL alone works; EQUAL plus a declined condition must fail outright
    // rather than applying only the supported predicate.
    let supported = equality_only_query().filter(vec![equal_to("status", "open")]).execute();
    assert_eq!(supported.expect("equality supported").len(), 3);

    let mixed = equality_only_query()
        .filter(vec![equal_to("status", "open"), like("id", "r*")])
        .execute();
    assert!(mixed.is_err(), "partial evaluation would return a wrong result set");
}
