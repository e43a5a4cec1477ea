//! Cache backend selection at startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{CacheStore, MemoryCacheStore};
use crate::config::{CacheBackend, CacheSettings};

use super::redis::RedisCacheStore;

/// Outcome of binding the configured cache backend.
#[derive(Clone)]
pub enum CacheBinding {
    /// Turned off in configuration.
    Disabled,
    /// Configured but unreachable at startup; requests read the database.
    Unavailable { reason: String },
    Ready(Arc<dyn CacheStore>),
}

impl CacheBinding {
    pub fn store(&self) -> Option<Arc<dyn CacheStore>> {
        match self {
            CacheBinding::Ready(store) => Some(store.clone()),
            CacheBinding::Disabled | CacheBinding::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CacheBinding::Ready(_))
    }
}

impl std::fmt::Debug for CacheBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBinding::Disabled => f.write_str("Disabled"),
            CacheBinding::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
            CacheBinding::Ready(_) => f.write_str("Ready(<CacheStore>)"),
        }
    }
}

/// Connect the configured backend. Never fails: an unreachable Redis leaves
/// the service running uncached.
pub async fn bind_cache(settings: &CacheSettings) -> CacheBinding {
    if !settings.enabled {
        info!(target = "socialfeed::cache", "Cache disabled");
        return CacheBinding::Disabled;
    }

    let store: Arc<dyn CacheStore> = match settings.backend {
        CacheBackend::Redis => match RedisCacheStore::connect(settings).await {
            Ok(store) => {
                if let Err(err) = store.ping().await {
                    warn!(
                        target = "socialfeed::cache",
                        error = %err,
                        "Redis is not answering; requests will fall back to the database"
                    );
                }
                Arc::new(store)
            }
            Err(err) => {
                warn!(
                    target = "socialfeed::cache",
                    error = %err,
                    "Redis unreachable at startup; serving without a cache"
                );
                return CacheBinding::Unavailable {
                    reason: err.to_string(),
                };
            }
        },
        CacheBackend::Memory => Arc::new(MemoryCacheStore::with_capacity(settings.memory_capacity)),
    };

    info!(
        target = "socialfeed::cache",
        backend = ?settings.backend,
        prefix = %settings.key_prefix,
        "Cache ready"
    );
    CacheBinding::Ready(store)
}
