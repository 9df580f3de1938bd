//! Chorus response cache.
//!
//! - **KeyedCache**: process-wide TTL map with oldest-first bulk eviction
//! - **Keys**: `namespace:discriminator` construction with canonical queries
//! - **Middleware**: read-path interceptor replaying cached responses
//! - **InvalidationBus**: write-path deletion driven by [`Mutation`]
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! capacity = 1000
//! default_ttl_seconds = 300
//! posts_ttl_seconds = 120
//! sweep_interval_seconds = 300
//! # ... see config.rs for all options
//! ```

mod config;
mod error;
mod invalidation;
mod keys;
mod lock;
mod middleware;
mod plan;
mod response;
mod store;
mod sweeper;

pub use config::CacheConfig;
pub use error::CacheError;
pub use invalidation::InvalidationBus;
pub use keys::{
    CacheKey, NAMESPACE_SEPARATOR, Namespace, canonical_query, field_discriminator, make_key,
};
pub use middleware::{
    BypassFn, CacheLayerState, CachePolicy, KeyFn, is_cacheable_method, keyed_by_path_segment,
    keyed_by_query, keyed_by_uuid_segment, response_cache_layer,
};
pub use plan::{Invalidation, InvalidationPlan, Mutation};
pub use response::{BufferError, CachedResponse, buffer_response, should_store_response};
pub use store::{CacheStats, KeyedCache, ResponseStore};
pub use sweeper::spawn_sweeper;

pub(crate) use lock::{rw_read, rw_write};

/// The cache instance shared by every HTTP route.
pub type ResponseCache = KeyedCache<CachedResponse>;
