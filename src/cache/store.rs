//! Cache storage backends.
//!
//! The read-through and invalidation layers only speak [`CacheStore`]. The
//! production backend is Redis (`infra::redis`); [`MemoryCacheStore`] mirrors
//! its key/TTL/`SCAN MATCH` semantics in process for tests and single-node
//! deployments.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use glob::Pattern;
use lru::LruCache;
use thiserror::Error;

use super::lock::rw_read;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

/// Entries kept by [`MemoryCacheStore::new`] before the least recently used
/// one is evicted.
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key-value store with expiry and glob enumeration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Delete `keys`, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Every live key matching the glob `pattern`.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process [`CacheStore`] with per-entry expiry and LRU eviction.
///
/// Expired entries are dropped when a read touches them and on every scan;
/// the capacity bounds whatever is never read again.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, Entry>>,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_capacity(NonZeroUsize::new(DEFAULT_MEMORY_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        rw_read(&self.entries, SOURCE, "len")
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries held, expired ones included.
    pub fn retained(&self) -> usize {
        rw_read(&self.entries, SOURCE, "retained").len()
    }

    /// Whether `key` is currently present. Does not touch recency.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        rw_read(&self.entries, SOURCE, "contains")
            .peek(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "purge_expired");
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            entries.pop(&key);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let live = entries.get(key).map(|entry| entry.is_live(now));
        match live {
            Some(true) => Ok(entries.peek(key).map(|entry| entry.value.clone())),
            Some(false) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set_with_expiry").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "delete");
        let removed = keys
            .iter()
            .filter_map(|key| entries.pop(key))
            .filter(|entry| entry.is_live(now))
            .count();
        Ok(removed as u64)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let pattern = Pattern::new(pattern).map_err(CacheError::backend)?;
        self.purge_expired();
        let mut keys: Vec<String> = rw_read(&self.entries, SOURCE, "scan_keys")
            .iter()
            .map(|(key, _)| key)
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
