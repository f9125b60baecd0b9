use std::time::Duration;

use async_trait::async_trait;

use super::StoreResult;

/// A central key/value store shared by every instance of the service.
///
/// Implementations must be safe for concurrent use. A missing key is
/// reported as [`StoreError::KeyNotFound`](super::StoreError::KeyNotFound)
/// by `get` and `delete`; `keys` returns an empty list when nothing matches.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()>;

    /// Reads the raw bytes stored under `key`.
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Removes `key`.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lists the keys matching a glob pattern (`*` wildcard).
    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
