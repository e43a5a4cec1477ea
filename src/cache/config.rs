//! Cache configuration.
//!
//! Controls the key prefix and per-family TTLs via `socialfeed.toml`.

use std::time::Duration;

use super::keys::Family;

// Default values for cache configuration
const DEFAULT_KEY_PREFIX: &str = "";
const DEFAULT_LISTING_TTL_SECS: u64 = 300;
const DEFAULT_ENTITY_TTL_SECS: u64 = 600;
const DEFAULT_STATS_TTL_SECS: u64 = 600;
const DEFAULT_SCAN_COUNT: u32 = 100;

/// Resolved cache configuration shared by read-through and invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Serve reads through the cache and invalidate on writes.
    pub enabled: bool,
    /// Prepended to every key and pattern.
    pub key_prefix: String,
    /// TTL for search, owner and saved-post listings.
    pub listing_ttl_secs: u64,
    /// TTL for post singletons.
    pub entity_ttl_secs: u64,
    /// TTL for per-owner aggregates.
    pub stats_ttl_secs: u64,
    /// `COUNT` hint passed to each `SCAN` round.
    pub scan_count: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            listing_ttl_secs: DEFAULT_LISTING_TTL_SECS,
            entity_ttl_secs: DEFAULT_ENTITY_TTL_SECS,
            stats_ttl_secs: DEFAULT_STATS_TTL_SECS,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            key_prefix: settings.key_prefix.clone(),
            listing_ttl_secs: settings.listing_ttl.as_secs(),
            entity_ttl_secs: settings.entity_ttl.as_secs(),
            stats_ttl_secs: settings.stats_ttl.as_secs(),
            scan_count: settings.scan_count.get(),
        }
    }
}

impl CacheConfig {
    /// Expiry applied when populating an entry of `family`.
    pub fn ttl_for(&self, family: Family) -> Duration {
        let secs = match family {
            Family::PostSearch | Family::PostOwner | Family::SavedPostOwner => {
                self.listing_ttl_secs
            }
            Family::PostEntity => self.entity_ttl_secs,
            Family::PostStats => self.stats_ttl_secs,
        };
        Duration::from_secs(secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.key_prefix, "");
        assert_eq!(config.listing_ttl_secs, 300);
        assert_eq!(config.entity_ttl_secs, 600);
        assert_eq!(config.stats_ttl_secs, 600);
        assert_eq!(config.scan_count, 100);
    }

    #[test]
    fn ttl_follows_family() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_for(Family::PostSearch), Duration::from_secs(300));
        assert_eq!(config.ttl_for(Family::SavedPostOwner), Duration::from_secs(300));
        assert_eq!(config.ttl_for(Family::PostEntity), Duration::from_secs(600));
        assert_eq!(config.ttl_for(Family::PostStats), Duration::from_secs(600));
    }

    #[test]
    fn zero_ttl_is_raised_to_one_second() {
        let config = CacheConfig {
            listing_ttl_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.ttl_for(Family::PostOwner), Duration::from_secs(1));
    }
}
