//! Read-through orchestration.
//!
//! Check the cache, fall back to the loader on a miss, populate with the
//! family TTL. Cache failures degrade to a miss and are never surfaced.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::store::CacheStore;

const METRIC_CACHE_HIT: &str = "socialfeed_cache_hit_total";
const METRIC_CACHE_MISS: &str = "socialfeed_cache_miss_total";
const METRIC_CACHE_ERROR: &str = "socialfeed_cache_error_total";

/// Where a response body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Database,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Sourced<T> {
    pub fn cached(value: T) -> Self {
        Self {
            value,
            source: Source::Cache,
        }
    }

    pub fn loaded(value: T) -> Self {
        Self {
            value,
            source: Source::Database,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            source: self.source,
        }
    }
}

#[derive(Clone)]
pub struct ReadThrough {
    store: Arc<dyn CacheStore>,
    config: Arc<CacheConfig>,
}

impl ReadThrough {
    pub fn new(store: Arc<dyn CacheStore>, config: Arc<CacheConfig>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Serve `key` from the cache, or run `loader` and cache its result.
    pub async fn fetch<T, E, F, Fut>(&self, key: &CacheKey, loader: F) -> Result<Sourced<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.config.enabled {
            return loader().await.map(Sourced::loaded);
        }

        let rendered = key.render(&self.config.key_prefix);
        if let Some(value) = self.lookup::<T>(key, &rendered).await {
            return Ok(Sourced::cached(value));
        }

        let value = loader().await?;
        self.populate(key, &rendered, &value).await;
        Ok(Sourced::loaded(value))
    }

    /// Like [`fetch`](Self::fetch) for singletons; absent values are not cached.
    pub async fn fetch_optional<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        loader: F,
    ) -> Result<Option<Sourced<T>>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        if !self.config.enabled {
            return loader().await.map(|value| value.map(Sourced::loaded));
        }

        let rendered = key.render(&self.config.key_prefix);
        if let Some(value) = self.lookup::<T>(key, &rendered).await {
            return Ok(Some(Sourced::cached(value)));
        }

        let Some(value) = loader().await? else {
            return Ok(None);
        };
        self.populate(key, &rendered, &value).await;
        Ok(Some(Sourced::loaded(value)))
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey, rendered: &str) -> Option<T> {
        let family = key.family().label();

        let cached = match self.store.get(rendered).await {
            Ok(cached) => cached,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "get").increment(1);
                warn!(key = rendered, error = %err, "Cache read failed; loading from store");
                None
            }
        };

        let decoded = cached.and_then(|json| match serde_json::from_str::<T>(&json) {
            Ok(value) => Some(value),
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "decode").increment(1);
                warn!(key = rendered, error = %err, "Discarding undecodable cache entry");
                None
            }
        });

        match decoded {
            Some(value) => {
                counter!(METRIC_CACHE_HIT, "family" => family).increment(1);
                Some(value)
            }
            None => {
                counter!(METRIC_CACHE_MISS, "family" => family).increment(1);
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &CacheKey, rendered: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "encode").increment(1);
                warn!(key = rendered, error = %err, "Failed to encode cache entry");
                return;
            }
        };

        let ttl = self.config.ttl_for(key.family());
        if let Err(err) = self.store.set_with_expiry(rendered, &json, ttl).await {
            counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
            warn!(key = rendered, error = %err, "Cache write failed");
        }
    }
}
