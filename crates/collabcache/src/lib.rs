//! Read-through, write-invalidating cache layer for the collaboration graph.
//!
//! Every cached repository decorates an authoritative repository from
//! `collabcache_core::storage`. Reads are served from a central key/value
//! store and populated on a miss. Writes delete every key the write may
//! make stale before the authoritative call runs.
//!
//! - [`store`]: central store implementations (in-memory LRU, Redis)
//! - [`cache`]: the adapter and the traced base repository
//! - [`storage`]: one cached decorator per entity, plus an in-memory
//!   authoritative repository
//! - [`options`]: the repository builder, the only way configuration
//!   reaches this layer
#![cfg_attr(
    not(feature = "testing"),
    doc = r#"
The fault-injecting store is only built with the `testing` feature:

```compile_fail
use collabcache::testing::FaultyStore;
```
"#
)]

pub mod cache;
pub mod options;
pub mod storage;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{BaseCacheRepository, CacheAdapter, CacheOp, Telemetry};
pub use options::{CachedRepository, RepositoryBuilder, RepositoryOption};
pub use storage::*;
pub use store::MemoryStore;

#[cfg(feature = "redis")]
pub use store::RedisStore;
