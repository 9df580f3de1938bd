//! Response cache middleware.
//!
//! Wraps a read handler: a hit replays the stored response without running the
//! handler, a miss runs it and stores the buffered result. Writes and requests
//! the policy bypasses never touch the store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::keys::{Namespace, canonical_query, make_key};
use super::response::{buffer_response, should_store_response};
use super::store::ResponseStore;

/// Computes the discriminator for a request; `None` leaves the request uncached.
pub type KeyFn = Arc<dyn Fn(&Request<Body>) -> Option<String> + Send + Sync>;

/// Returns true for requests that must skip the cache entirely.
pub type BypassFn = Arc<dyn Fn(&Request<Body>) -> bool + Send + Sync>;

/// Per-route caching options.
#[derive(Clone)]
pub struct CachePolicy {
    pub namespace: Namespace,
    pub key_fn: KeyFn,
    pub ttl: Duration,
    pub should_bypass: BypassFn,
}

impl CachePolicy {
    /// Policy keyed by the canonical query string, bypassing all writes.
    pub fn new(namespace: Namespace, ttl: Duration) -> Self {
        Self {
            namespace,
            key_fn: keyed_by_query(),
            ttl,
            should_bypass: Arc::new(|request: &Request<Body>| {
                !is_cacheable_method(request.method())
            }),
        }
    }

    pub fn with_key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = key_fn;
        self
    }

    pub fn with_bypass(mut self, should_bypass: BypassFn) -> Self {
        self.should_bypass = should_bypass;
        self
    }
}

/// Only GET is served from or written to the cache. HEAD is excluded because
/// its empty body must never be replayed to a GET.
pub fn is_cacheable_method(method: &Method) -> bool {
    method == Method::GET
}

/// Discriminator from the canonical (sorted) query string.
pub fn keyed_by_query() -> KeyFn {
    Arc::new(|request: &Request<Body>| {
        Some(canonical_query(request.uri().query().unwrap_or("")))
    })
}

/// Discriminator from the path segment at `index` (zero-based, ignoring the
/// leading slash), e.g. index 2 of `/api/posts/{id}` is the post id.
pub fn keyed_by_path_segment(index: usize) -> KeyFn {
    Arc::new(move |request: &Request<Body>| {
        path_segment(request, index).map(str::to_string)
    })
}

/// Discriminator from a UUID path segment in its canonical hyphenated
/// lowercase form, matching the ids invalidation deletes. Segments that are
/// not UUIDs are left uncached.
pub fn keyed_by_uuid_segment(index: usize) -> KeyFn {
    Arc::new(move |request: &Request<Body>| {
        path_segment(request, index)
            .and_then(|segment| Uuid::parse_str(segment).ok())
            .map(|id| id.to_string())
    })
}

fn path_segment(request: &Request<Body>, index: usize) -> Option<&str> {
    request
        .uri()
        .path()
        .trim_start_matches('/')
        .split('/')
        .nth(index)
        .filter(|segment| !segment.is_empty())
}

/// State handed to [`response_cache_layer`].
#[derive(Clone)]
pub struct CacheLayerState {
    pub store: Arc<dyn ResponseStore>,
    pub policy: CachePolicy,
    pub enabled: bool,
    pub body_limit_bytes: usize,
}

#[instrument(
    skip_all,
    fields(namespace = %cache.policy.namespace, path = %request.uri().path())
)]
pub async fn response_cache_layer(
    State(cache): State<CacheLayerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.enabled
        || !is_cacheable_method(request.method())
        || (cache.policy.should_bypass)(&request)
    {
        return next.run(request).await;
    }

    let Some(discriminator) = (cache.policy.key_fn)(&request) else {
        return next.run(request).await;
    };
    let key = make_key(cache.policy.namespace, &discriminator);

    match cache.store.lookup(&key) {
        Ok(Some(cached)) => {
            debug!(cache_key = %key, outcome = "hit", "serving cached response");
            return cached.into_response();
        }
        Ok(None) => {
            debug!(cache_key = %key, outcome = "miss", "cache miss, executing handler");
        }
        Err(err) => {
            warn!(cache_key = %key, error = %err, "cache lookup failed, executing handler");
        }
    }

    let response = next.run(request).await;
    if !should_store_response(&response) {
        return response;
    }

    let oversized = response
        .body()
        .size_hint()
        .upper()
        .is_none_or(|upper| upper > cache.body_limit_bytes as u64);
    if oversized {
        debug!(cache_key = %key, "response body unbounded or over limit, not caching");
        return response;
    }

    match buffer_response(response).await {
        Ok((rebuilt, cached)) => {
            if let Err(err) = cache.store.store(&key, cached, cache.policy.ttl) {
                warn!(cache_key = %key, error = %err, "failed to store response");
            }
            rebuilt
        }
        Err((rebuilt, err)) => {
            warn!(cache_key = %key, error = %err, "failed to buffer response");
            rebuilt
        }
    }
}
