//! Declarative filter and sort descriptors for the query pipeline.
//!
//! An [`AttributeFilter`] pairs an attribute name with a [`FilterCondition`],
//! a closed enumeration of predicate kinds. Each variant carries exactly the
//! operand shape it needs (single value, pair, or list), so an impossible
//! combination such as `BETWEEN` with three operands cannot be constructed.
//! Evaluation is an exhaustive match over the variants; there is no runtime
//! default arm that silently passes unknown conditions.
//!
//! Filters are evaluated against records serialized to [`serde_json::Value`],
//! which keeps the descriptors independent of any concrete record type.
//! Attribute names may use dotted paths (`"customer.address.city"`) to
//! address nested fields.
//!
//! # Example
//!
//! ```
//! use cachestore_storage::filter::{between, equal_to, or};
//!
//! let open_or_midsize = or(vec![
//!     equal_to("status", "open"),
//!     between("amount", 10, 20),
//! ]);
//! ```

use std::cmp::Ordering;

use serde_json::Value;

/// A single predicate over one record attribute.
///
/// Construct these through the free functions in this module
/// ([`equal_to`], [`between`], [`is_in`], ...) rather than by hand.
///
/// The `attribute` field is empty for the [`and`] / [`or`] combinators,
/// which recurse over the whole record instead of a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilter {
    attribute: String,
    condition: FilterCondition,
}

impl AttributeFilter {
    /// The attribute name this filter applies to (dotted paths allowed).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The predicate kind and its operands.
    #[must_use]
    pub fn condition(&self) -> &FilterCondition {
        &self.condition
    }

    /// A short label for the condition kind, used in error reporting.
    #[must_use]
    pub fn condition_label(&self) -> &'static str {
        self.condition.label()
    }

    /// Evaluates this filter against a serialized record.
    ///
    /// Returns `true` when the record satisfies the predicate. A missing
    /// attribute satisfies only [`FilterCondition::IsNull`]; every other
    /// condition evaluates to `false` for an absent attribute. Operands
    /// that cannot be compared with the attribute's type (e.g. `GT` between
    /// a string and a number) also evaluate to `false`.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        let attr = lookup_path(record, &self.attribute);
        match &self.condition {
            FilterCondition::IsNull => attr.is_none_or(Value::is_null),
            FilterCondition::NotNull => attr.is_some_and(|v| !v.is_null()),
            FilterCondition::And(filters) => filters.iter().all(|f| f.matches(record)),
            FilterCondition::Or(filters) => filters.iter().any(|f| f.matches(record)),
            condition => match attr {
                Some(value) => condition.matches_value(value),
                None => false,
            },
        }
    }
}

/// The closed enumeration of filter predicate kinds.
///
/// Each variant carries its required operand shape. Matching on this enum is
/// exhaustive by construction, so adding a future condition kind forces every
/// evaluation site to handle it at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Attribute value equals the operand.
    Equal(Value),
    /// String attribute contains the operand substring, or array attribute
    /// contains the operand element.
    Contains(Value),
    /// Array attribute is a superset of the operand list.
    ContainsAll(Vec<Value>),
    /// Array attribute intersects the operand list.
    ContainsAny(Vec<Value>),
    /// String attribute matches a wildcard pattern (`*` = any run of
    /// characters; everything else is literal).
    Like(String),
    /// Attribute value is a member of the operand list.
    In(Vec<Value>),
    /// Attribute is absent or JSON null.
    IsNull,
    /// Attribute is present and not JSON null.
    NotNull,
    /// Attribute value lies within the inclusive `[from, to]` range.
    Between {
        /// Inclusive lower bound.
        from: Value,
        /// Inclusive upper bound.
        to: Value,
    },
    /// Attribute value is strictly greater than the operand.
    GreaterThan(Value),
    /// Attribute value is greater than or equal to the operand.
    GreaterThanEqual(Value),
    /// Attribute value is strictly less than the operand.
    LessThan(Value),
    /// Attribute value is less than or equal to the operand.
    LessThanEqual(Value),
    /// All nested filters match (recursive conjunction).
    And(Vec<AttributeFilter>),
    /// Any nested filter matches (recursive disjunction).
    Or(Vec<AttributeFilter>),
}

impl FilterCondition {
    /// A short label for this condition kind, used in error reporting.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equal(_) => "EQUAL",
            Self::Contains(_) => "CONTAINS",
            Self::ContainsAll(_) => "CONTAINS_ALL",
            Self::ContainsAny(_) => "CONTAINS_ANY",
            Self::Like(_) => "LIKE",
            Self::In(_) => "IN",
            Self::IsNull => "IS_NULL",
            Self::NotNull => "NOT_NULL",
            Self::Between { .. } => "BETWEEN",
            Self::GreaterThan(_) => "GT",
            Self::GreaterThanEqual(_) => "GTE",
            Self::LessThan(_) => "LT",
            Self::LessThanEqual(_) => "LTE",
            Self::And(_) => "AND",
            Self::Or(_) => "OR",
        }
    }

    /// Evaluates the non-recursive, non-null conditions against a present
    /// attribute value.
    fn matches_value(&self, value: &Value) -> bool {
        match self {
            Self::Equal(operand) => value == operand,
            Self::Contains(operand) => match value {
                Value::String(s) => operand.as_str().is_some_and(|needle| s.contains(needle)),
                Value::Array(items) => items.contains(operand),
                _ => false,
            },
            Self::ContainsAll(operands) => match value {
                Value::Array(items) => operands.iter().all(|o| items.contains(o)),
                _ => false,
            },
            Self::ContainsAny(operands) => match value {
                Value::Array(items) => operands.iter().any(|o| items.contains(o)),
                _ => false,
            },
            Self::Like(pattern) => value.as_str().is_some_and(|s| wildcard_match(pattern, s)),
            Self::In(operands) => operands.contains(value),
            Self::Between { from, to } => {
                compare_values(value, from).is_some_and(Ordering::is_ge)
                    && compare_values(value, to).is_some_and(Ordering::is_le)
            },
            Self::GreaterThan(operand) => compare_values(value, operand).is_some_and(Ordering::is_gt),
            Self::GreaterThanEqual(operand) => {
                compare_values(value, operand).is_some_and(Ordering::is_ge)
            },
            Self::LessThan(operand) => compare_values(value, operand).is_some_and(Ordering::is_lt),
            Self::LessThanEqual(operand) => {
                compare_values(value, operand).is_some_and(Ordering::is_le)
            },
            // Handled in AttributeFilter::matches, which has the whole record.
            Self::IsNull | Self::NotNull | Self::And(_) | Self::Or(_) => false,
        }
    }
}

/// Sort direction for an [`AttributeSort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

/// A single ordering key for the query pipeline's sort stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSort {
    attribute: String,
    direction: SortDirection,
}

impl AttributeSort {
    /// The attribute name to order by (dotted paths allowed).
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The configured direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Creates an ordering key over `attribute` in the given direction.
#[must_use]
pub fn sort_by(attribute: impl Into<String>, direction: SortDirection) -> AttributeSort {
    AttributeSort { attribute: attribute.into(), direction }
}

fn filter(attribute: impl Into<String>, condition: FilterCondition) -> AttributeFilter {
    AttributeFilter { attribute: attribute.into(), condition }
}

/// `attribute == operand`
///
/// Operands are anything with an infallible [`Value`] conversion: scalars,
/// strings, or prebuilt JSON values.
#[must_use]
pub fn equal_to(attribute: impl Into<String>, operand: impl Into<Value>) -> AttributeFilter {
    filter(attribute, FilterCondition::Equal(operand.into()))
}

/// String/array `attribute` contains `operand`.
#[must_use]
pub fn contains(attribute: impl Into<String>, operand: impl Into<Value>) -> AttributeFilter {
    filter(attribute, FilterCondition::Contains(operand.into()))
}

/// Array `attribute` is a superset of `operands`.
#[must_use]
pub fn contains_all<T: Into<Value>>(
    attribute: impl Into<String>,
    operands: impl IntoIterator<Item = T>,
) -> AttributeFilter {
    filter(
        attribute,
        FilterCondition::ContainsAll(operands.into_iter().map(Into::into).collect()),
    )
}

/// Array `attribute` intersects `operands`.
#[must_use]
pub fn contains_any<T: Into<Value>>(
    attribute: impl Into<String>,
    operands: impl IntoIterator<Item = T>,
) -> AttributeFilter {
    filter(
        attribute,
        FilterCondition::ContainsAny(operands.into_iter().map(Into::into).collect()),
    )
}

/// String `attribute` matches a wildcard `pattern` (`*` = any run).
#[must_use]
pub fn like(attribute: impl Into<String>, pattern: impl Into<String>) -> AttributeFilter {
    filter(attribute, FilterCondition::Like(pattern.into()))
}

/// `attribute` is a member of `operands`.
#[must_use]
pub fn is_in<T: Into<Value>>(
    attribute: impl Into<String>,
    operands: impl IntoIterator<Item = T>,
) -> AttributeFilter {
    filter(attribute, FilterCondition::In(operands.into_iter().map(Into::into).collect()))
}

/// `attribute` is absent or null.
#[must_use]
pub fn is_null(attribute: impl Into<String>) -> AttributeFilter {
    filter(attribute, FilterCondition::IsNull)
}

/// `attribute` is present and not null.
#[must_use]
pub fn not_null(attribute: impl Into<String>) -> AttributeFilter {
    filter(attribute, FilterCondition::NotNull)
}

/// `from <= attribute <= to` (both endpoints inclusive).
#[must_use]
pub fn between(
    attribute: impl Into<String>,
    from: impl Into<Value>,
    to: impl Into<Value>,
) -> AttributeFilter {
    filter(attribute, FilterCondition::Between { from: from.into(), to: to.into() })
}

/// `attribute > operand`
#[must_use]
pub fn greater_than(attribute: impl Into<String>, operand: impl Into<Value>) -> AttributeFilter {
    filter(attribute, FilterCondition::GreaterThan(operand.into()))
}

/// `attribute >= operand`
#[must_use]
pub fn greater_than_equal(
    attribute: impl Into<String>,
    operand: impl Into<Value>,
) -> AttributeFilter {
    filter(attribute, FilterCondition::GreaterThanEqual(operand.into()))
}

/// `attribute < operand`
#[must_use]
pub fn less_than(attribute: impl Into<String>, operand: impl Into<Value>) -> AttributeFilter {
    filter(attribute, FilterCondition::LessThan(operand.into()))
}

/// `attribute <= operand`
#[must_use]
pub fn less_than_equal(attribute: impl Into<String>, operand: impl Into<Value>) -> AttributeFilter {
    filter(attribute, FilterCondition::LessThanEqual(operand.into()))
}

/// All nested `filters` match.
#[must_use]
pub fn and(filters: Vec<AttributeFilter>) -> AttributeFilter {
    filter("", FilterCondition::And(filters))
}

/// Any nested `filter` matches.
#[must_use]
pub fn or(filters: Vec<AttributeFilter>) -> AttributeFilter {
    filter("", FilterCondition::Or(filters))
}

/// Resolves a dotted attribute path against a serialized record.
///
/// Returns `None` when any path segment is missing or the intermediate value
/// is not an object.
pub(crate) fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Orders two JSON values of compatible types.
///
/// Numbers compare numerically, strings lexicographically, booleans with
/// `false < true`. Mixed or non-scalar types are incomparable (`None`).
pub(crate) fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            l.as_f64().and_then(|l| r.as_f64().map(|r| l.total_cmp(&r)))
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Matches `text` against `pattern`, where `*` matches any (possibly empty)
/// run of characters and every other character is literal.
///
/// Iterative greedy matching with backtracking over the last star, so
/// patterns with many stars stay linear in practice.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if p < pat.len() && pat[p] == txt[t] {
            p += 1;
            t += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last star absorb one more character.
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}
