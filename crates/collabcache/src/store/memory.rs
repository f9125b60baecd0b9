//! In-memory central store with LRU eviction.
//!
//! Provides a thread-safe key/value store with TTL support using tokio
//! synchronization primitives and an LRU eviction policy. It plays the role
//! of the central store for single-process deployments and tests, so every
//! cached repository sharing one `MemoryStore` observes the same state.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use collabcache_core::cache::{pattern_matches, KeyValueStore, StoreError, StoreResult};

/// A single stored value with optional expiration.
#[derive(Debug, Clone)]
struct StoreEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory store implementation with LRU eviction.
///
/// Expired entries are removed lazily, when they are next accessed or
/// enumerated. Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<LruCache<String, StoreEntry>>>,
}

impl MemoryStore {
    /// Creates a new store holding at most `max_entries` keys.
    ///
    /// A capacity of zero is rounded up to one.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of live (non-expired) keys.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.iter().filter(|(_, e)| !e.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns true if `key` is present and not expired.
    pub async fn contains(&self, key: &str) -> bool {
        let entries = self.entries.read().await;
        entries.peek(key).is_some_and(|e| !e.is_expired())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.put(key.to_string(), StoreEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let mut entries = self.entries.write().await;

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Err(StoreError::KeyNotFound)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        match entries.pop(key) {
            Some(entry) if !entry.is_expired() => Ok(()),
            _ => Err(StoreError::KeyNotFound),
        }
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut entries = self.entries.write().await;

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired())
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }

        Ok(entries
            .iter()
            .filter(|(key, _)| pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
