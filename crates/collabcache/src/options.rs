//! Construction of cached repositories.
//!
//! ```ignore
//! let users = RepositoryBuilder::new()
//!     .store(Arc::new(MemoryStore::new(10_000)))
//!     .repository(authoritative_users)
//!     .default_ttl(Duration::from_secs(300))
//!     .build::<CachedUserRepository<_>>()?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::Dispatch;

use collabcache_core::cache::KeyValueStore;
use collabcache_core::storage::{RepositoryError, Result};

use crate::cache::{BaseCacheRepository, Telemetry};

/// A cached repository that can be assembled from a base cache repository
/// and the authoritative repository it wraps.
pub trait CachedRepository: Sized {
    type Inner: ?Sized;

    fn from_parts(base: BaseCacheRepository, repository: Arc<Self::Inner>) -> Self;
}

/// A single named construction option.
pub enum RepositoryOption<R: ?Sized> {
    /// Central store handle (required).
    Store(Arc<dyn KeyValueStore>),
    /// Diagnostic sink. Defaults to a no-op dispatcher.
    Logger(Dispatch),
    /// Span factory. Defaults to a no-op dispatcher.
    Tracer(Dispatch),
    /// Authoritative repository (required).
    Repository(Arc<R>),
    /// TTL applied to every cached value. Defaults to none.
    DefaultTtl(Duration),
}

impl<R: ?Sized> RepositoryOption<R> {
    pub fn name(&self) -> &'static str {
        match self {
            RepositoryOption::Store(_) => "store",
            RepositoryOption::Logger(_) => "logger",
            RepositoryOption::Tracer(_) => "tracer",
            RepositoryOption::Repository(_) => "repository",
            RepositoryOption::DefaultTtl(_) => "default_ttl",
        }
    }
}

impl<R: ?Sized> fmt::Debug for RepositoryOption<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepositoryOption::{}", self.name())
    }
}

/// Collects options and builds any [`CachedRepository`] wrapping `R`.
///
/// Every option may be given once. Repeating one is an error reported by
/// [`build`](Self::build), as is a missing store or repository.
pub struct RepositoryBuilder<R: ?Sized> {
    store: Option<Arc<dyn KeyValueStore>>,
    logger: Option<Dispatch>,
    tracer: Option<Dispatch>,
    repository: Option<Arc<R>>,
    default_ttl: Option<Duration>,
    error: Option<RepositoryError>,
}

impl<R: ?Sized> Default for RepositoryBuilder<R> {
    fn default() -> Self {
        Self {
            store: None,
            logger: None,
            tracer: None,
            repository: None,
            default_ttl: None,
            error: None,
        }
    }
}

impl<R: ?Sized> RepositoryBuilder<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(self, store: Arc<dyn KeyValueStore>) -> Self {
        self.option(RepositoryOption::Store(store))
    }

    pub fn logger(self, logger: Dispatch) -> Self {
        self.option(RepositoryOption::Logger(logger))
    }

    pub fn tracer(self, tracer: Dispatch) -> Self {
        self.option(RepositoryOption::Tracer(tracer))
    }

    pub fn repository(self, repository: Arc<R>) -> Self {
        self.option(RepositoryOption::Repository(repository))
    }

    pub fn default_ttl(self, ttl: Duration) -> Self {
        self.option(RepositoryOption::DefaultTtl(ttl))
    }

    /// Uses the current default `tracing` dispatcher as both logger and
    /// tracer.
    pub fn with_global_telemetry(self) -> Self {
        let telemetry = Telemetry::global();
        self.logger(telemetry.logger().clone())
            .tracer(telemetry.tracer().clone())
    }

    /// Applies a single option.
    pub fn option(mut self, option: RepositoryOption<R>) -> Self {
        if self.error.is_some() {
            return self;
        }

        let name = option.name();
        let duplicate = match option {
            RepositoryOption::Store(store) => self.store.replace(store).is_some(),
            RepositoryOption::Logger(logger) => self.logger.replace(logger).is_some(),
            RepositoryOption::Tracer(tracer) => self.tracer.replace(tracer).is_some(),
            RepositoryOption::Repository(repo) => self.repository.replace(repo).is_some(),
            RepositoryOption::DefaultTtl(ttl) => self.default_ttl.replace(ttl).is_some(),
        };

        if duplicate {
            self.error = Some(RepositoryError::InvalidRepository(format!(
                "option `{name}` given more than once"
            )));
        }
        self
    }

    /// Builds the base cache repository alone, e.g. to share it between
    /// several cached repositories.
    pub fn build_base(&mut self) -> Result<BaseCacheRepository> {
        if let Some(err) = self.error.clone() {
            return Err(err);
        }

        let store = self.store.clone().ok_or_else(|| {
            RepositoryError::InvalidRepository("missing option `store`".to_string())
        })?;
        let telemetry = Telemetry::new(
            self.logger.clone().unwrap_or_else(Dispatch::none),
            self.tracer.clone().unwrap_or_else(Dispatch::none),
        );

        Ok(BaseCacheRepository::new(store, telemetry, self.default_ttl))
    }

    pub fn build<T>(mut self) -> Result<T>
    where
        T: CachedRepository<Inner = R>,
    {
        let base = self.build_base()?;
        let repository = self.repository.take().ok_or_else(|| {
            RepositoryError::InvalidRepository("missing option `repository`".to_string())
        })?;

        Ok(T::from_parts(base, repository))
    }
}
