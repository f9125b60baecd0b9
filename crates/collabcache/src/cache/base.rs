//! Traced base cache repository.
//!
//! Every cached repository holds one of these. It wraps the adapter
//! primitives in `repository.cache.base/<Op>` spans and implements the
//! read-through and invalidate-then-write flows in one place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use collabcache_core::cache::{
    CacheError, Invalidation, InvalidationPlan, InvalidationRequest, KeyValueStore,
    Result as CacheResult,
};
use collabcache_core::storage::Result;
use collabcache_core::RequestContext;

use super::adapter::CacheAdapter;
use super::telemetry::{CacheOp, Telemetry};

/// The adapter plus injected telemetry. Cheap to clone; clones share the
/// central store.
#[derive(Clone)]
pub struct BaseCacheRepository {
    adapter: CacheAdapter,
    telemetry: Telemetry,
}

impl BaseCacheRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        telemetry: Telemetry,
        default_ttl: Option<Duration>,
    ) -> Self {
        Self {
            adapter: CacheAdapter::new(store, default_ttl),
            telemetry,
        }
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub async fn set<T>(&self, ctx: &RequestContext, key: &str, value: &T) -> CacheResult<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        self.telemetry
            .traced(CacheOp::Set, key, self.adapter.set(ctx, key, value))
            .await
    }

    /// Looks up `key`. A miss is `Ok(None)`.
    pub async fn get<T>(&self, ctx: &RequestContext, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let result = self
            .telemetry
            .traced(CacheOp::Get, key, self.adapter.get(ctx, key))
            .await;

        match result {
            Ok(value) => Ok(Some(value)),
            Err(CacheError::Miss) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn delete(&self, ctx: &RequestContext, key: &str) -> CacheResult<()> {
        self.telemetry
            .traced(CacheOp::Delete, key, self.adapter.delete(ctx, key))
            .await
    }

    pub async fn delete_pattern(&self, ctx: &RequestContext, pattern: &str) -> CacheResult<()> {
        self.telemetry
            .traced(
                CacheOp::DeletePattern,
                pattern,
                self.adapter.delete_pattern(ctx, pattern),
            )
            .await
    }

    /// Runs an authoritative call under the request context without caching.
    pub async fn proxy<T, F>(&self, ctx: &RequestContext, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        ctx.run(call).await?
    }

    /// Returns the cached value under `key`, or fetches it from the
    /// authoritative repository and caches it.
    ///
    /// A cache read failure fails the call without consulting the
    /// repository. A failure to populate the cache after a successful fetch
    /// fails the call as well.
    pub async fn read_through<T, F>(&self, ctx: &RequestContext, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get::<T>(ctx, key).await? {
            self.telemetry
                .log(|| tracing::trace!(key = %key, "Cache hit"));
            return Ok(value);
        }

        self.telemetry
            .log(|| tracing::trace!(key = %key, "Cache miss"));
        let value = self.proxy(ctx, fetch).await?;

        if let Err(err) = self.set(ctx, key, &value).await {
            self.telemetry
                .log(|| tracing::warn!(key = %key, error = %err, "Failed to populate cache"));
            return Err(err.into());
        }

        Ok(value)
    }

    /// Executes a plan step by step, stopping at the first failure.
    pub async fn invalidate(&self, ctx: &RequestContext, plan: &InvalidationPlan) -> Result<()> {
        for step in plan.steps() {
            let result = match step {
                Invalidation::Pattern(pattern) => self.delete_pattern(ctx, pattern).await,
                Invalidation::Key(key) => self.delete(ctx, key).await,
            };

            if let Err(err) = result {
                self.telemetry.log(|| {
                    tracing::warn!(step = ?step, error = %err, "Cache invalidation failed")
                });
                return Err(err.into());
            }
        }
        Ok(())
    }

    /// Invalidates everything the write affects, then performs it.
    ///
    /// The authoritative repository is not called when invalidation fails.
    pub async fn write<T, F>(
        &self,
        ctx: &RequestContext,
        request: &InvalidationRequest,
        write: F,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.invalidate(ctx, &request.plan()).await?;
        let output = self.proxy(ctx, write).await?;

        self.telemetry.log(|| {
            tracing::debug!(
                resource = %request.resource(),
                operation = %request.op(),
                "Cache invalidated for write"
            )
        });
        Ok(output)
    }

    /// Invalidation for updates: invalidate, update, refresh `key` with the
    /// fresh value, then invalidate the plan's patterns once more so no list
    /// repopulated during the update survives.
    pub async fn update<T, F>(
        &self,
        ctx: &RequestContext,
        request: &InvalidationRequest,
        key: &str,
        update: F,
    ) -> Result<T>
    where
        T: Serialize + Sync,
        F: Future<Output = Result<T>>,
    {
        let plan = request.plan();
        self.invalidate(ctx, &plan).await?;

        let fresh = self.proxy(ctx, update).await?;

        if let Err(err) = self.set(ctx, key, &fresh).await {
            self.telemetry
                .log(|| tracing::warn!(key = %key, error = %err, "Failed to refresh cache"));
            return Err(err.into());
        }

        self.invalidate(ctx, &plan.patterns_only()).await?;

        self.telemetry.log(|| {
            tracing::debug!(
                resource = %request.resource(),
                key = %key,
                "Cache refreshed after update"
            )
        });
        Ok(fresh)
    }
}
