//! Test doubles for the central store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use collabcache_core::cache::{KeyValueStore, StoreError, StoreResult};

use crate::store::MemoryStore;

#[derive(Debug, Default, Clone)]
struct Faults {
    set: Option<StoreError>,
    get: Option<StoreError>,
    delete: Option<StoreError>,
    keys: Option<StoreError>,
}

/// A [`MemoryStore`] that can be told to fail specific operations.
///
/// Calls that are not failing are forwarded to the wrapped store, so tests
/// can seed keys and inspect them afterwards through [`FaultyStore::inner`].
#[derive(Debug)]
pub struct FaultyStore {
    inner: MemoryStore,
    faults: RwLock<Faults>,
    get_calls: AtomicUsize,
    keys_calls: AtomicUsize,
}

impl Default for FaultyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::wrap(MemoryStore::new(10_000))
    }

    pub fn wrap(inner: MemoryStore) -> Self {
        Self {
            inner,
            faults: RwLock::new(Faults::default()),
            get_calls: AtomicUsize::new(0),
            keys_calls: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub async fn fail_set(&self, err: StoreError) {
        self.faults.write().await.set = Some(err);
    }

    pub async fn fail_get(&self, err: StoreError) {
        self.faults.write().await.get = Some(err);
    }

    pub async fn fail_delete(&self, err: StoreError) {
        self.faults.write().await.delete = Some(err);
    }

    pub async fn fail_keys(&self, err: StoreError) {
        self.faults.write().await.keys = Some(err);
    }

    pub async fn fail_all(&self, err: StoreError) {
        let mut faults = self.faults.write().await;
        faults.set = Some(err.clone());
        faults.get = Some(err.clone());
        faults.delete = Some(err.clone());
        faults.keys = Some(err);
    }

    /// Clears every injected failure.
    pub async fn heal(&self) {
        *self.faults.write().await = Faults::default();
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn keys_calls(&self) -> usize {
        self.keys_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        if let Some(err) = self.faults.read().await.set.clone() {
            return Err(err);
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.faults.read().await.get.clone() {
            return Err(err);
        }
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        if let Some(err) = self.faults.read().await.delete.clone() {
            return Err(err);
        }
        self.inner.delete(key).await
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.keys_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.faults.read().await.keys.clone() {
            return Err(err);
        }
        self.inner.keys(pattern).await
    }
}
