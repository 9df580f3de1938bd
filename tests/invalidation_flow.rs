mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use chorus::cache::{
    CacheConfig, CacheError, CacheKey, CacheStats, CachedResponse, ResponseStore,
};
use serde_json::json;
use support::{TestApp, parse_id};

#[tokio::test]
async fn like_is_visible_on_next_read() {
    let (app, cache) = TestApp::new();
    let author = app.register("author").await;
    let fan = app.register("fan").await;
    let post = app.create_post(author, "first").await;
    let uri = format!("/api/posts/{post}");

    let (_, before) = app.get(&uri).await;
    assert_eq!(before["like_count"], 0);
    assert!(cache.get(&format!("post:{post}")).is_some());

    let (status, liked) = app
        .send(Method::PUT, &format!("{uri}/like"), Some(fan), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["liked"], true);

    let (_, after) = app.get(&uri).await;
    assert_eq!(after["like_count"], 1);
}

#[tokio::test]
async fn like_is_visible_through_any_id_spelling() {
    let (app, cache) = TestApp::new();
    let author = app.register("author").await;
    let fan = app.register("fan").await;
    let post = app.create_post(author, "first").await;
    let upper = format!("/api/posts/{}", post.to_string().to_uppercase());
    let simple = format!("/api/posts/{}", post.simple());

    let (status, before) = app.get(&upper).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["like_count"], 0);
    app.get(&simple).await;
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&format!("post:{post}")).is_some());

    let (status, _) = app
        .send(Method::PUT, &format!("/api/posts/{post}/like"), Some(fan), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after_upper) = app.get(&upper).await;
    let (_, after_simple) = app.get(&simple).await;
    assert_eq!(after_upper["like_count"], 1);
    assert_eq!(after_simple["like_count"], 1);
}

#[tokio::test]
async fn unlike_round_trip_restores_count() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let fan = app.register("fan").await;
    let post = app.create_post(author, "first").await;
    let like = format!("/api/posts/{post}/like");

    app.send(Method::PUT, &like, Some(fan), None).await;
    let (_, unliked) = app.send(Method::PUT, &like, Some(fan), None).await;
    assert_eq!(unliked["liked"], false);

    let (_, fresh) = app.get(&format!("/api/posts/{post}")).await;
    assert_eq!(fresh["like_count"], 0);
}

#[tokio::test]
async fn new_post_appears_in_cached_listing() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    app.create_post(author, "one").await;

    let (_, listing) = app.get("/api/posts").await;
    assert_eq!(listing["total"], 1);

    app.create_post(author, "two").await;

    let (_, listing) = app.get("/api/posts?page=1").await;
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["items"][0]["title"], "two");
}

#[tokio::test]
async fn deleted_post_is_gone_from_cache() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let post = app.create_post(author, "short-lived").await;
    let uri = format!("/api/posts/{post}");

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::DELETE, &uri, Some(author), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn follow_refreshes_both_profiles() {
    let (app, _cache) = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    app.get(&format!("/api/users/{alice}")).await;
    app.get(&format!("/api/users/{bob}")).await;

    let (status, _) = app
        .send(Method::PUT, &format!("/api/users/{bob}/follow"), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, bob_profile) = app.get(&format!("/api/users/{bob}")).await;
    let (_, alice_profile) = app.get(&format!("/api/users/{alice}")).await;
    assert_eq!(bob_profile["follower_count"], 1);
    assert_eq!(alice_profile["following_count"], 1);
}

#[tokio::test]
async fn review_refreshes_list_and_rating() {
    let (app, _cache) = TestApp::new();
    let author = app.register("author").await;
    let critic = app.register("critic").await;
    let post = app.create_post(author, "rated").await;
    let reviews = format!("/api/posts/{post}/reviews");

    let (_, empty) = app.get(&reviews).await;
    assert_eq!(empty.as_array().map(Vec::len), Some(0));
    app.get(&format!("/api/posts/{post}")).await;

    let (status, review) = app
        .send(
            Method::POST,
            &reviews,
            Some(critic),
            Some(json!({ "rating": 4, "body": "solid" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "review failed: {review}");

    let (_, listed) = app.get(&reviews).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    let (_, rated) = app.get(&format!("/api/posts/{post}")).await;
    assert_eq!(rated["average_rating"], 4.0);
}

/// Every call fails, as a cache backend that has gone away would.
struct UnavailableStore;

impl ResponseStore for UnavailableStore {
    fn lookup(&self, _key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Err(CacheError::unavailable("lookup", "backend offline"))
    }

    fn store(
        &self,
        _key: &CacheKey,
        _response: CachedResponse,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::unavailable("store", "backend offline"))
    }

    fn remove(&self, _key: &CacheKey) -> Result<bool, CacheError> {
        Err(CacheError::unavailable("remove", "backend offline"))
    }

    fn remove_namespace(&self, _namespace: &str) -> Result<usize, CacheError> {
        Err(CacheError::unavailable("remove_namespace", "backend offline"))
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        Err(CacheError::unavailable("stats", "backend offline"))
    }
}

#[tokio::test]
async fn unavailable_cache_never_fails_requests() {
    let app = TestApp::with_store(Arc::new(UnavailableStore), CacheConfig::default());
    let author = app.register("author").await;
    let fan = app.register("fan").await;
    let post = app.create_post(author, "resilient").await;
    let uri = format!("/api/posts/{post}");

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, liked) = app
        .send(Method::PUT, &format!("{uri}/like"), Some(fan), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_id(&liked["post"]), post);

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["like_count"], 1);

    let (status, body) = app.get("/api/cache/stats").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "cache_error");
}
