//! Cache-coherent read path for post, saved-post and stats listings.
//!
//! - [`keys`] derives deterministic keys and the glob patterns covering them.
//! - [`planner`] maps a mutation to the keys and patterns it makes stale.
//! - [`invalidation`] runs that plan against a [`CacheStore`].
//! - [`read_through`] serves reads from the cache and populates on miss.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! listing_ttl_seconds = 300
//! # ... see config.rs for all options
//! ```

mod config;
mod invalidation;
mod keys;
mod lock;
mod planner;
mod read_through;
mod store;

pub use config::CacheConfig;
pub use invalidation::Invalidator;
pub use keys::{CacheKey, Family};
pub use planner::{Invalidation, InvalidationPlan, Namespace};
pub use read_through::{ReadThrough, Source, Sourced};
pub use store::{CacheError, CacheStore, DEFAULT_MEMORY_CAPACITY, MemoryCacheStore};
