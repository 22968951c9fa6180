//! Storage error types and result alias.
//!
//! This module defines the error types that can occur during cache storage
//! and query operations. All storage backends must map their internal errors
//! to these standardized error types.
//!
//! # Error Types
//!
//! - [`StorageError::Unsupported`] - Query feature not implemented by this backend
//! - [`StorageError::InvalidArgument`] - Offset/limit outside the valid range
//! - [`StorageError::TypeMismatch`] - Cache looked up with a different value type
//! - [`StorageError::Serialization`] - Record encoding failures during attribute extraction
//! - [`StorageError::Backend`] - Failures originating in the physical storage layer
//!
//! A missing key is deliberately **not** an error: `get` and `remove` on an
//! absent key report `Ok(None)`, so callers can always distinguish "no such
//! key" (benign) from "feature not supported" (a configuration defect) from
//! "underlying store failed" (environmental).
//!
//! # Example
//!
//! ```
//! use cachestore_storage::{StorageError, StorageResult};
//!
//! fn reject_sort() -> StorageResult<()> {
//!     Err(StorageError::unsupported("sort"))
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
///
/// All storage and query operations return this type, providing consistent
/// error handling across different backend implementations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage and query operations.
///
/// This enum represents the canonical set of errors that any storage backend
/// can produce. Backend implementations should map their internal error types
/// to these variants.
///
/// Errors preserve their source chain via the `#[source]` attribute, enabling
/// debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The query configuration requests a filter condition or sort that this
    /// backend does not implement.
    ///
    /// Reported as an explicit, named failure rather than silently ignoring
    /// the feature or returning a wrong result set. `feature` names the
    /// declined capability (e.g. `"sort"`, `"filter: LIKE"`).
    #[error("Unsupported query feature: {feature}")]
    Unsupported {
        /// The declined query capability.
        feature: String,
    },

    /// An offset or limit value is outside the valid range.
    ///
    /// The query pipeline rejects an offset beyond the remaining sequence
    /// length instead of producing a silently-truncated result.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// A cache was looked up with a value type different from the one it was
    /// created with.
    ///
    /// Registry lookups are idempotent keyed purely by name, so a second
    /// lookup must request the same value type the first one created the
    /// cache with.
    #[error("Cache '{cache}' holds a different value type (requested {expected})")]
    TypeMismatch {
        /// The cache name that was looked up.
        cache: String,
        /// The value type the caller requested.
        expected: &'static str,
    },

    /// A record could not be serialized for attribute extraction.
    ///
    /// This occurs when the query pipeline cannot encode a candidate record
    /// to evaluate filter or sort attributes against it. It typically
    /// indicates a record type whose `Serialize` implementation fails.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// A failure originating in the physical storage layer.
    ///
    /// Propagated unchanged to the caller; the core does not retry or mask
    /// it. The in-memory backend never produces this variant.
    #[error("Backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
        /// The underlying error from the storage layer.
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    /// Creates a new `Unsupported` error naming the declined feature.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported { feature: feature.into() }
    }

    /// Creates a new `InvalidArgument` error with the given message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Creates a new `TypeMismatch` error for the given cache name and
    /// requested type.
    #[must_use]
    pub fn type_mismatch(cache: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch { cache: cache.into(), expected }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Backend` error with the given message.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into(), source: None }
    }

    /// Creates a new `Backend` error with a message and source error.
    #[must_use]
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend { message: message.into(), source: Some(Arc::new(source)) }
    }
}
