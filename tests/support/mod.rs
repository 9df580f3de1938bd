#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use chorus::cache::{CacheConfig, ResponseCache, ResponseStore};
use chorus::config::RealtimeSettings;
use chorus::infra::http::{AppComponents, AppState, build_router};
use chorus::infra::memory::MemoryStore;
use chorus::realtime::ConnectionRegistry;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ConnectionRegistry>,
}

impl TestApp {
    pub fn new() -> (Self, Arc<ResponseCache>) {
        let config = CacheConfig::default();
        let cache = Arc::new(ResponseCache::new(&config));
        (Self::with_store(cache.clone(), config), cache)
    }

    pub fn with_store(responses: Arc<dyn ResponseStore>, cache: CacheConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let state = AppState::from_components(AppComponents {
            store: store.clone(),
            responses,
            registry: registry.clone(),
            cache,
            realtime: RealtimeSettings::default(),
        });
        Self {
            router: build_router(state),
            store,
            registry,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        actor: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header("x-user-id", actor.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be json")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn register(&self, username: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(json!({ "username": username })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        parse_id(&body)
    }

    pub async fn create_post(&self, author: Uuid, title: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/posts",
                Some(author),
                Some(json!({ "title": title, "body": "hello", "tags": ["rust"] })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
        parse_id(&body)
    }
}

pub fn parse_id(body: &Value) -> Uuid {
    body["id"]
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .expect("response should carry an id")
}
