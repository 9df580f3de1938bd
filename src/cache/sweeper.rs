//! Background expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::store::KeyedCache;

/// Spawn a task that drops expired entries every `interval`.
///
/// Entries nobody reads after expiry would otherwise hold memory until
/// capacity eviction reaches them. Abort the handle on shutdown.
pub fn spawn_sweeper<V>(cache: Arc<KeyedCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // Skip the first immediate tick
        loop {
            ticker.tick().await;
            let removed = cache.sweep_expired();
            if removed > 0 {
                debug!(removed, remaining = cache.len(), "swept expired cache entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_unread_expired_entries() {
        let cache = Arc::new(KeyedCache::with_limits(
            NonZeroUsize::new(10).expect("non-zero"),
            Duration::from_secs(1),
            10,
        ));
        cache.set("post:1", "stale".to_string());

        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(cache.len(), 0);

        handle.abort();
    }
}
