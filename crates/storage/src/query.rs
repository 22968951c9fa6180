//! In-process query pipeline: filter → sort → offset → limit.
//!
//! A [`Query`] is a transient, single-use builder obtained from
//! [`Storage::query`](crate::Storage::query). It is bound to one collection
//! through a [`ValueSource`] and materializes results with
//! [`execute`](Query::execute), which applies the four stages in fixed order
//! to the value sequence the source yields at execute time. No transactional
//! snapshot isolation is provided; mutations racing with an in-flight execute
//! are resolved by the source.
//!
//! # Stage semantics
//!
//! 1. **Filter** — keep values for which *all* configured
//!    [`AttributeFilter`]s hold (logical AND). No filters: everything passes.
//! 2. **Sort** — stable multi-key sort in listed priority order. No sort:
//!    the source's order is kept.
//! 3. **Offset** — drop the first N values. An offset beyond the remaining
//!    sequence length is rejected with
//!    [`InvalidArgument`](crate::StorageError::InvalidArgument); the policy
//!    is reject, not clamp, and is applied uniformly.
//! 4. **Limit** — keep at most the first M values. A limit beyond the
//!    remainder is not an error (limit is a maximum, not an index).
//!
//! # Example
//!
//! ```
//! use cachestore_storage::filter::{equal_to, sort_by, SortDirection};
//! use cachestore_storage::{InMemoryStorage, Storage};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Order { status: String, amount: i64 }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = InMemoryStorage::<String, Order>::new("order");
//! cache.put("o1".into(), Order { status: "open".into(), amount: 12 })?;
//! cache.put("o2".into(), Order { status: "closed".into(), amount: 7 })?;
//!
//! let open = cache
//!     .query()
//!     .filter(vec![equal_to("status", "open")])
//!     .sort(vec![sort_by("amount", SortDirection::Ascending)])
//!     .execute()?;
//! assert_eq!(open.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{StorageError, StorageResult};
use crate::filter::{
    compare_values, lookup_path, AttributeFilter, AttributeSort, FilterCondition, SortDirection,
};

/// Supplies the value sequence a [`Query`] executes over.
///
/// A storage backend hands the pipeline a source bound to one collection.
/// `values()` is called once per [`execute`](Query::execute), so repeated
/// executes observe the collection's current contents, not a snapshot frozen
/// at `query()` time.
///
/// The default capability methods declare full in-process support for every
/// filter condition and for sorting. A backend that declines a feature
/// (e.g. one that can only push certain predicates down to its store)
/// overrides them; the pipeline then fails with
/// [`Unsupported`](crate::StorageError::Unsupported) naming the feature
/// instead of silently returning wrong results.
pub trait ValueSource<V>: Send + Sync {
    /// Yields the collection's current value sequence.
    fn values(&self) -> StorageResult<Vec<V>>;

    /// Whether this source can evaluate the given filter condition.
    fn supports_condition(&self, _condition: &FilterCondition) -> bool {
        true
    }

    /// Whether this source supports the sort stage.
    fn supports_sort(&self) -> bool {
        true
    }
}

/// Transient, single-use query over one collection.
///
/// Obtained from [`Storage::query`](crate::Storage::query). Configure with
/// the builder methods, then call [`execute`](Query::execute). Re-invoking
/// `execute` on the same query is allowed and re-reads the bound source; the
/// query cannot be re-bound to a different collection.
pub struct Query<V> {
    source: Arc<dyn ValueSource<V>>,
    filters: Vec<AttributeFilter>,
    sort: Vec<AttributeSort>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl<V> Query<V> {
    /// Creates a query bound to the given source.
    ///
    /// Backends call this from their `query()` implementation; application
    /// code goes through [`Storage::query`](crate::Storage::query).
    #[must_use]
    pub fn new(source: Arc<dyn ValueSource<V>>) -> Self {
        Self { source, filters: Vec::new(), sort: Vec::new(), offset: None, limit: None }
    }

    /// Sets the filter list. All filters must hold for a value to pass.
    #[must_use]
    pub fn filter(mut self, filters: Vec<AttributeFilter>) -> Self {
        self.filters = filters;
        self
    }

    /// Sets the ordering keys, in priority order.
    #[must_use]
    pub fn sort(mut self, sort: Vec<AttributeSort>) -> Self {
        self.sort = sort;
        self
    }

    /// Drops the first `offset` values of the filtered, sorted sequence.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Keeps at most the first `limit` values of what remains.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl<V: Serialize> Query<V> {
    /// Materializes the result sequence.
    ///
    /// Applies filter → sort → offset → limit to the source's current value
    /// sequence and returns the ordered results.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Unsupported`] — the source declines a configured filter condition or the
    ///   sort stage.
    /// - [`StorageError::InvalidArgument`] — the offset exceeds the length of the filtered, sorted
    ///   sequence.
    /// - [`StorageError::Serialization`] — a candidate record could not be serialized for attribute
    ///   extraction; no partial result is returned.
    /// - [`StorageError::Backend`] — the source failed to read the collection.
    pub fn execute(&self) -> StorageResult<Vec<V>> {
        self.check_capabilities()?;

        let values = self.source.values()?;
        let input_len = values.len();

        let mut values = if self.filters.is_empty() && self.sort.is_empty() {
            values
        } else {
            self.filter_and_sort(values)?
        };

        if let Some(offset) = self.offset {
            if offset > values.len() {
                return Err(StorageError::invalid_argument(format!(
                    "offset {offset} exceeds sequence length {}",
                    values.len()
                )));
            }
            values.drain(..offset);
        }

        if let Some(limit) = self.limit {
            values.truncate(limit);
        }

        trace!(input = input_len, results = values.len(), "query executed");
        Ok(values)
    }

    /// Verifies the source supports every configured filter condition and,
    /// when a sort is set, the sort stage.
    fn check_capabilities(&self) -> StorageResult<()> {
        for filter in &self.filters {
            self.check_condition(filter)?;
        }
        if !self.sort.is_empty() && !self.source.supports_sort() {
            return Err(StorageError::unsupported("sort"));
        }
        Ok(())
    }

    /// Recursively checks one filter, descending into AND/OR operands.
    fn check_condition(&self, filter: &AttributeFilter) -> StorageResult<()> {
        if !self.source.supports_condition(filter.condition()) {
            return Err(StorageError::unsupported(format!("filter: {}", filter.condition_label())));
        }
        match filter.condition() {
            FilterCondition::And(nested) | FilterCondition::Or(nested) => {
                for inner in nested {
                    self.check_condition(inner)?;
                }
                Ok(())
            },
            _ => Ok(()),
        }
    }

    /// Serializes each candidate once, then applies the filter and sort
    /// stages over the serialized form.
    fn filter_and_sort(&self, values: Vec<V>) -> StorageResult<Vec<V>> {
        let mut candidates: Vec<(V, Value)> = values
            .into_iter()
            .map(|v| {
                serde_json::to_value(&v)
                    .map(|json| (v, json))
                    .map_err(|e| StorageError::serialization_with_source("record encoding failed", e))
            })
            .collect::<StorageResult<_>>()?;

        if !self.filters.is_empty() {
            candidates.retain(|(_, json)| self.filters.iter().all(|f| f.matches(json)));
        }

        if !self.sort.is_empty() {
            // Vec::sort_by is stable, so equal keys keep the filtered order.
            candidates.sort_by(|(_, a), (_, b)| self.compare_records(a, b));
        }

        Ok(candidates.into_iter().map(|(v, _)| v).collect())
    }

    /// Multi-key comparison in listed priority order.
    fn compare_records(&self, left: &Value, right: &Value) -> Ordering {
        for key in &self.sort {
            let ordering = compare_attributes(
                lookup_path(left, key.attribute()),
                lookup_path(right, key.attribute()),
            );
            let ordering = match key.direction() {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Orders two attribute values for the sort stage.
///
/// Absent or null attributes order before present ones (ascending). Present
/// values order by kind rank first (bool < number < string < array < object),
/// then by value within a kind; kinds without a value ordering (arrays,
/// objects) compare equal and the stable sort leaves them in their prior
/// relative order. The comparator is a total order over every value the
/// source can yield; `slice::sort_by` panics on anything weaker.
fn compare_attributes(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|v| !v.is_null());
    let right = right.filter(|v| !v.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => kind_rank(l)
            .cmp(&kind_rank(r))
            .then_with(|| compare_values(l, r).unwrap_or(Ordering::Equal)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        // Nulls are filtered out before ranking; the arm keeps the match total.
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
