//! Cache backend adapter.
//!
//! Turns raw store calls into the four cache primitives, encodes values as
//! JSON and classifies every failure. The store's `KeyNotFound` sentinel
//! never leaves this module as an error: it becomes [`CacheError::Miss`] on
//! reads and success everywhere else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use collabcache_core::cache::{
    deserialize_value, serialize_value, CacheError, KeyValueStore, Result, StoreError, StoreResult,
};
use collabcache_core::RequestContext;

/// Runs a store call under the request context.
async fn guarded<T, F>(ctx: &RequestContext, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    ctx.run(fut).await?
}

/// Adapter between typed cache operations and a [`KeyValueStore`].
#[derive(Clone)]
pub struct CacheAdapter {
    store: Arc<dyn KeyValueStore>,
    default_ttl: Option<Duration>,
}

impl CacheAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>, default_ttl: Option<Duration>) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Serializes and stores `value`. Idempotent: a miss reported by the
    /// store counts as success.
    pub async fn set<T>(&self, ctx: &RequestContext, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let bytes = serialize_value(value)
            .map_err(|e| CacheError::Write(StoreError::Serialization(e.to_string())))?;

        match guarded(ctx, self.store.set(key, &bytes, self.default_ttl)).await {
            Ok(()) | Err(StoreError::KeyNotFound) => Ok(()),
            Err(err) => Err(CacheError::Write(err)),
        }
    }

    /// Reads and deserializes the value under `key`.
    ///
    /// A value that no longer deserializes into `T` is reported as a miss,
    /// so the caller refetches and overwrites it.
    pub async fn get<T>(&self, ctx: &RequestContext, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = match guarded(ctx, self.store.get(key)).await {
            Ok(bytes) => bytes,
            Err(StoreError::KeyNotFound) => return Err(CacheError::Miss),
            Err(err) => return Err(CacheError::Read(err)),
        };

        deserialize_value(&bytes).map_err(|err| {
            tracing::warn!(key = %key, error = %err, "Cached value deserialization failed");
            CacheError::Miss
        })
    }

    /// Removes a single key. Deleting a missing key succeeds.
    pub async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<()> {
        match guarded(ctx, self.store.delete(key)).await {
            Ok(()) | Err(StoreError::KeyNotFound) => Ok(()),
            Err(err) => Err(CacheError::Delete(err)),
        }
    }

    /// Enumerates the keys matching `pattern` and deletes each of them.
    ///
    /// Stops at the first failure that is not a miss.
    pub async fn delete_pattern(&self, ctx: &RequestContext, pattern: &str) -> Result<()> {
        let keys = match guarded(ctx, self.store.keys(pattern)).await {
            Ok(keys) => keys,
            Err(StoreError::KeyNotFound) => return Ok(()),
            Err(err) => return Err(CacheError::Delete(err)),
        };

        for key in &keys {
            self.delete(ctx, key).await?;
        }

        tracing::trace!(pattern = %pattern, deleted = keys.len(), "Pattern invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::FaultyStore;
    use collabcache_core::ContextError;

    fn adapter(store: Arc<dyn KeyValueStore>) -> CacheAdapter {
        CacheAdapter::new(store, Some(Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let ctx = RequestContext::new();
        let cache = adapter(Arc::new(MemoryStore::new(100)));

        cache.set(&ctx, "label:1", &vec!["a", "b"]).await.unwrap();
        let value: Vec<String> = cache.get(&ctx, "label:1").await.unwrap();

        assert_eq!(value, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_get_missing_is_miss() {
        let ctx = RequestContext::new();
        let cache = adapter(Arc::new(MemoryStore::new(100)));

        let result: Result<String> = cache.get(&ctx, "label:404").await;
        assert_eq!(result, Err(CacheError::Miss));
    }

    #[tokio::test]
    async fn test_undecodable_value_is_miss() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        store.set("label:1", b"not json", None).await.unwrap();
        let cache = adapter(store);

        let result: Result<Vec<String>> = cache.get(&ctx, "label:1").await;
        assert_eq!(result, Err(CacheError::Miss));
    }

    #[tokio::test]
    async fn test_miss_sentinel_is_success_for_writes() {
        let ctx = RequestContext::new();
        let store = Arc::new(FaultyStore::new());
        store.fail_all(StoreError::KeyNotFound).await;
        let cache = adapter(store);

        assert_eq!(cache.set(&ctx, "todo:1", "x").await, Ok(()));
        assert_eq!(cache.delete(&ctx, "todo:1").await, Ok(()));
        assert_eq!(cache.delete_pattern(&ctx, "todo:*").await, Ok(()));
        let read: Result<String> = cache.get(&ctx, "todo:1").await;
        assert_eq!(read, Err(CacheError::Miss));
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let ctx = RequestContext::new();
        let store = Arc::new(FaultyStore::new());
        let down = StoreError::ConnectionFailed("refused".to_string());
        store.fail_all(down.clone()).await;
        let cache = adapter(store);

        let read: Result<String> = cache.get(&ctx, "todo:1").await;
        assert_eq!(read, Err(CacheError::Read(down.clone())));
        assert_eq!(
            cache.set(&ctx, "todo:1", "x").await,
            Err(CacheError::Write(down.clone()))
        );
        assert_eq!(
            cache.delete(&ctx, "todo:1").await,
            Err(CacheError::Delete(down.clone()))
        );
        assert_eq!(
            cache.delete_pattern(&ctx, "todo:*").await,
            Err(CacheError::Delete(down))
        );
    }

    #[tokio::test]
    async fn test_delete_pattern_removes_only_matches() {
        let ctx = RequestContext::new();
        let store = Arc::new(MemoryStore::new(100));
        store.set("todo:GetByOwner:u1:0:10:all", b"[]", None).await.unwrap();
        store.set("todo:GetByOwner:u2:0:10:all", b"[]", None).await.unwrap();
        store.set("todo:todo_1", b"{}", None).await.unwrap();
        let cache = adapter(store.clone());

        cache
            .delete_pattern(&ctx, "todo:GetByOwner:u1:*")
            .await
            .unwrap();

        assert!(!store.contains("todo:GetByOwner:u1:0:10:all").await);
        assert!(store.contains("todo:GetByOwner:u2:0:10:all").await);
        assert!(store.contains("todo:todo_1").await);
    }

    #[tokio::test]
    async fn test_cancelled_context_is_not_reclassified() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let cache = adapter(Arc::new(MemoryStore::new(100)));

        let err = cache.delete(&ctx, "todo:1").await.unwrap_err();
        assert_eq!(err.context_error(), Some(ContextError::Cancelled));
    }
}
