//! Cache configuration.
//!
//! Capacity, TTLs and sweep cadence for the keyed response cache, resolved
//! from the `[cache]` section of `chorus.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use super::keys::Namespace;

const DEFAULT_CAPACITY: usize = 1000;
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_POST_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_POSTS_TTL: Duration = Duration::from_secs(2 * 60);
const DEFAULT_USER_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_REVIEWS_TTL: Duration = Duration::from_secs(2 * 60);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_EVICTION_PERCENT: u8 = 10;
const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Resolved cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve and populate cached responses at all.
    pub enabled: bool,
    /// Maximum number of live entries.
    pub capacity: NonZeroUsize,
    /// TTL used when a caller does not name one.
    pub default_ttl: Duration,
    pub post_ttl: Duration,
    pub posts_ttl: Duration,
    pub user_ttl: Duration,
    pub reviews_ttl: Duration,
    /// Cadence of the background expiry sweep.
    pub sweep_interval: Duration,
    /// Share of entries dropped when the cache is full, in percent (1..=100).
    pub eviction_percent: u8,
    /// Responses larger than this are passed through without caching.
    pub body_limit_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            default_ttl: DEFAULT_TTL,
            post_ttl: DEFAULT_POST_TTL,
            posts_ttl: DEFAULT_POSTS_TTL,
            user_ttl: DEFAULT_USER_TTL,
            reviews_ttl: DEFAULT_REVIEWS_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            eviction_percent: DEFAULT_EVICTION_PERCENT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity,
            default_ttl: settings.default_ttl,
            post_ttl: settings.post_ttl,
            posts_ttl: settings.posts_ttl,
            user_ttl: settings.user_ttl,
            reviews_ttl: settings.reviews_ttl,
            sweep_interval: settings.sweep_interval,
            eviction_percent: settings.eviction_percent,
            body_limit_bytes: settings.body_limit_bytes,
        }
    }
}

impl CacheConfig {
    /// TTL applied to responses cached under `namespace`.
    pub fn ttl_for(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::Post => self.post_ttl,
            Namespace::Posts => self.posts_ttl,
            Namespace::User => self.user_ttl,
            Namespace::Reviews => self.reviews_ttl,
        }
    }
}
