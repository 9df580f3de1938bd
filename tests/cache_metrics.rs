use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chorus::cache::KeyedCache;
use chorus::realtime::{ConnectionHandle, ConnectionRegistry, RealtimeFanout};
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;
use uuid::Uuid;

#[tokio::test(start_paused = true)]
async fn cache_and_realtime_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // hit, miss, expiry and eviction
    let cache = KeyedCache::with_limits(
        NonZeroUsize::new(2).expect("non-zero"),
        Duration::from_secs(10),
        50,
    );
    assert!(cache.get("post:missing").is_none());
    cache.set("post:1", "one".to_string());
    assert!(cache.get("post:1").is_some());
    cache.set_with_ttl("post:short", "short".to_string(), Duration::from_secs(1));
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get("post:short").is_none());
    cache.set("post:2", "two".to_string());
    cache.set("post:3", "three".to_string());

    // delivery, closed and full connections
    let registry = Arc::new(ConnectionRegistry::new());
    let fanout = RealtimeFanout::new(registry.clone());
    let user = Uuid::new_v4();
    let (open, _open_rx) = ConnectionHandle::channel(1);
    let (closed, closed_rx) = ConnectionHandle::channel(1);
    registry.register(user, open);
    registry.register(user, closed);
    drop(closed_rx);

    assert_eq!(fanout.emit_to_user(user, "new-post", json!({ "n": 1 })), 1);
    assert_eq!(fanout.emit_to_user(user, "new-post", json!({ "n": 2 })), 0);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "chorus_cache_hit_total",
        "chorus_cache_miss_total",
        "chorus_cache_expired_total",
        "chorus_cache_evict_total",
        "chorus_realtime_delivered_total",
        "chorus_realtime_dropped_total",
        "chorus_realtime_connections",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
