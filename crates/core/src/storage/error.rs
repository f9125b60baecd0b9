use thiserror::Error;

use crate::cache::{CacheError, StoreError, WriteOp};
use crate::context::ContextError;

/// Errors that can occur during repository operations.
///
/// Cache failures keep their underlying [`StoreError`] as the source so
/// callers can match on the category and still inspect the cause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} {operation} failed: {reason}")]
    WriteFailed {
        entity_type: &'static str,
        operation: WriteOp,
        reason: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("cache read error")]
    CacheRead(#[source] StoreError),
    #[error("cache write error")]
    CacheWrite(#[source] StoreError),
    #[error("cache delete error")]
    CacheDelete(#[source] StoreError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("invalid repository: {0}")]
    InvalidRepository(String),
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// True for the three cache categories.
    pub fn is_cache_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::CacheRead(_)
                | RepositoryError::CacheWrite(_)
                | RepositoryError::CacheDelete(_)
        )
    }
}

impl From<CacheError> for RepositoryError {
    /// Context errors come through unwrapped. `Miss` is not expected here,
    /// the base repository turns it into `None`.
    fn from(err: CacheError) -> Self {
        if let Some(ctx) = err.context_error() {
            return RepositoryError::Context(ctx);
        }
        match err {
            CacheError::Miss => RepositoryError::CacheRead(StoreError::KeyNotFound),
            CacheError::Read(e) => RepositoryError::CacheRead(e),
            CacheError::Write(e) => RepositoryError::CacheWrite(e),
            CacheError::Delete(e) => RepositoryError::CacheDelete(e),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
