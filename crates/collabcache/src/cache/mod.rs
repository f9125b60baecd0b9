//! Cache protocol on top of a central store.
//!
//! - [`CacheAdapter`]: typed primitives and error classification
//! - [`BaseCacheRepository`]: traced primitives plus the read-through and
//!   write-invalidation flows shared by every cached repository
//! - [`Telemetry`]: the injected logger and tracer

mod adapter;
mod base;
mod telemetry;

pub use adapter::CacheAdapter;
pub use base::BaseCacheRepository;
pub use telemetry::{CacheOp, Telemetry};
