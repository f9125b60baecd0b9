use thiserror::Error;

use crate::context::ContextError;

/// Errors reported by a central key/value store.
///
/// `KeyNotFound` is the miss sentinel. The adapter consumes it and it never
/// reaches callers of the cached repositories as an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("key not found")]
    KeyNotFound,
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn is_miss(&self) -> bool {
        matches!(self, StoreError::KeyNotFound)
    }
}

/// Classified outcome of an adapter primitive.
///
/// `Miss` is one of the two valid outcomes of a lookup and is turned into
/// `None` by the base repository. The other variants identify which phase
/// of the cache protocol failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache miss")]
    Miss,
    #[error("cache read error")]
    Read(#[source] StoreError),
    #[error("cache write error")]
    Write(#[source] StoreError),
    #[error("cache delete error")]
    Delete(#[source] StoreError),
}

impl CacheError {
    /// The underlying store error, if any.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            CacheError::Miss => None,
            CacheError::Read(err) | CacheError::Write(err) | CacheError::Delete(err) => Some(err),
        }
    }

    /// Returns the context error when the failure was a cancellation or a
    /// deadline rather than a store fault.
    pub fn context_error(&self) -> Option<ContextError> {
        match self.store_error() {
            Some(StoreError::Context(err)) => Some(*err),
            _ => None,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for cache adapter operations.
pub type Result<T> = std::result::Result<T, CacheError>;
