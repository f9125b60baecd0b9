//! Injected logger and tracer.
//!
//! Both collaborators are `tracing` dispatchers. Spans are created on the
//! tracer and events are emitted on the logger, so an application can route
//! them to different subscribers (or silence either with
//! [`Dispatch::none`]).

use std::fmt;
use std::future::Future;

use tracing::instrument::{Instrument, WithSubscriber};
use tracing::{dispatcher, Dispatch, Span};

/// The four traced cache primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    Set,
    Get,
    Delete,
    DeletePattern,
}

impl CacheOp {
    /// The span name recorded for the primitive.
    pub fn span_name(&self) -> &'static str {
        match self {
            CacheOp::Set => "repository.cache.base/Set",
            CacheOp::Get => "repository.cache.base/Get",
            CacheOp::Delete => "repository.cache.base/Delete",
            CacheOp::DeletePattern => "repository.cache.base/DeletePattern",
        }
    }
}

impl fmt::Display for CacheOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.span_name())
    }
}

#[derive(Clone)]
pub struct Telemetry {
    logger: Dispatch,
    tracer: Dispatch,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(Dispatch::none(), Dispatch::none())
    }
}

impl Telemetry {
    pub fn new(logger: Dispatch, tracer: Dispatch) -> Self {
        Self { logger, tracer }
    }

    /// Uses the dispatcher that is currently the default for both roles.
    pub fn global() -> Self {
        let current = dispatcher::get_default(Dispatch::clone);
        Self::new(current.clone(), current)
    }

    pub fn logger(&self) -> &Dispatch {
        &self.logger
    }

    pub fn tracer(&self) -> &Dispatch {
        &self.tracer
    }

    /// Opens the span of a primitive on the tracer.
    pub fn span(&self, op: CacheOp, key: &str) -> Span {
        dispatcher::with_default(&self.tracer, || match op {
            CacheOp::Set => tracing::info_span!("repository.cache.base/Set", key = %key),
            CacheOp::Get => tracing::info_span!("repository.cache.base/Get", key = %key),
            CacheOp::Delete => tracing::info_span!("repository.cache.base/Delete", key = %key),
            CacheOp::DeletePattern => {
                tracing::info_span!("repository.cache.base/DeletePattern", pattern = %key)
            }
        })
    }

    /// Drives `fut` inside the primitive's span with the logger as the
    /// default dispatcher. The span closes when the future completes or is
    /// dropped.
    pub async fn traced<F>(&self, op: CacheOp, key: &str, fut: F) -> F::Output
    where
        F: Future,
    {
        fut.instrument(self.span(op, key))
            .with_subscriber(self.logger.clone())
            .await
    }

    /// Runs `f` with the logger as the default dispatcher.
    pub fn log<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.logger, f)
    }
}
