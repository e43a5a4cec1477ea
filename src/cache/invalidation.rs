//! Invalidation execution.
//!
//! Runs an [`InvalidationPlan`] against the cache store: every pattern is
//! enumerated with a scan, the results are merged with the exact keys, and
//! everything is removed in one bulk delete.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, instrument, warn};

use super::config::CacheConfig;
use super::planner::{Invalidation, InvalidationPlan};
use super::store::{CacheError, CacheStore};

const METRIC_INVALIDATED_KEYS: &str = "socialfeed_cache_invalidated_keys_total";
const METRIC_INVALIDATION_FAILED: &str = "socialfeed_cache_invalidation_failed_total";
const METRIC_INVALIDATE_MS: &str = "socialfeed_cache_invalidate_ms";

#[derive(Clone)]
pub struct Invalidator {
    store: Arc<dyn CacheStore>,
    config: Arc<CacheConfig>,
}

impl Invalidator {
    pub fn new(store: Arc<dyn CacheStore>, config: Arc<CacheConfig>) -> Self {
        Self { store, config }
    }

    /// Clear everything `invalidation` may have made stale.
    ///
    /// Failures are logged and counted but never returned: the mutation that
    /// triggered the invalidation has already been committed. Returns the
    /// number of keys removed.
    #[instrument(
        name = "cache.invalidate",
        skip_all,
        fields(namespace = invalidation.namespace.as_str())
    )]
    pub async fn invalidate(&self, invalidation: &Invalidation) -> u64 {
        if !self.config.enabled {
            return 0;
        }

        let plan = InvalidationPlan::from_invalidation(invalidation);
        match self.execute(&plan).await {
            Ok(removed) => {
                debug!(%plan, removed, "Cache invalidation complete");
                removed
            }
            Err(err) => {
                counter!(METRIC_INVALIDATION_FAILED).increment(1);
                warn!(
                    %plan,
                    owner_id = invalidation.owner_id,
                    entity_id = invalidation.entity_id,
                    error = %err,
                    "Cache invalidation failed; entries expire by TTL"
                );
                0
            }
        }
    }

    /// Scan every pattern, then delete the union with the exact keys.
    ///
    /// A failing scan does not stop the others; whatever was found is still
    /// deleted and the first error is returned afterwards.
    pub async fn execute(&self, plan: &InvalidationPlan) -> Result<u64, CacheError> {
        let started_at = Instant::now();
        let prefix = self.config.key_prefix.as_str();

        let mut keys: BTreeSet<String> = plan
            .exact_keys
            .iter()
            .map(|key| format!("{prefix}{key}"))
            .collect();
        let mut first_error = None;

        for pattern in &plan.patterns {
            match self.store.scan_keys(&format!("{prefix}{pattern}")).await {
                Ok(found) => keys.extend(found),
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "Cache scan failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        let mut removed = 0;
        if !keys.is_empty() {
            let keys: Vec<String> = keys.into_iter().collect();
            match self.store.delete(&keys).await {
                Ok(count) => removed = count,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        counter!(METRIC_INVALIDATED_KEYS).increment(removed);
        histogram!(METRIC_INVALIDATE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        match first_error {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }
}
