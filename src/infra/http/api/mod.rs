pub mod actor;
pub mod error;
pub mod handlers;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Query,
    http::Request,
    middleware as axum_middleware,
    routing::{MethodRouter, get, post, put},
};

use crate::application::pagination::{PostListParams, PostQuery};
use crate::cache::{
    CacheLayerState, CachePolicy, KeyFn, Namespace, keyed_by_uuid_segment, response_cache_layer,
};
use crate::infra::http::state::AppState;

pub fn build_api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/posts",
            cached(
                state,
                Namespace::Posts,
                posts_list_key(),
                get(handlers::list_posts).post(handlers::create_post),
            ),
        )
        .route(
            "/api/posts/{id}",
            cached(
                state,
                Namespace::Post,
                keyed_by_uuid_segment(2),
                get(handlers::get_post).delete(handlers::delete_post),
            ),
        )
        .route("/api/posts/{id}/like", put(handlers::toggle_like))
        .route(
            "/api/posts/{id}/reviews",
            cached(
                state,
                Namespace::Reviews,
                keyed_by_uuid_segment(2),
                get(handlers::list_reviews).post(handlers::create_review),
            ),
        )
        .route("/api/users", post(handlers::register_user))
        .route(
            "/api/users/{id}",
            cached(
                state,
                Namespace::User,
                keyed_by_uuid_segment(2),
                get(handlers::get_user),
            ),
        )
        .route("/api/users/{id}/follow", put(handlers::toggle_follow))
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/{id}/read",
            put(handlers::mark_notification_read),
        )
        .route("/api/messages", post(handlers::send_message))
        .route("/api/messages/{user_id}", get(handlers::conversation))
        .route("/api/cache/stats", get(handlers::cache_stats))
}

/// Wrap every method of `routes` in the response cache. Non-GET methods pass
/// through the layer untouched.
fn cached(
    state: &AppState,
    namespace: Namespace,
    key_fn: KeyFn,
    routes: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let layer_state = CacheLayerState {
        store: state.responses.clone(),
        policy: CachePolicy::new(namespace, state.cache.ttl_for(namespace)).with_key_fn(key_fn),
        enabled: state.cache.enabled,
        body_limit_bytes: state.cache.body_limit_bytes,
    };
    routes.layer(axum_middleware::from_fn_with_state(
        layer_state,
        response_cache_layer,
    ))
}

/// Listing discriminator from the normalized query, so `?page=1` and an empty
/// query share one entry. Unparseable queries are left uncached.
fn posts_list_key() -> KeyFn {
    Arc::new(|request: &Request<Body>| {
        let Query(params) = Query::<PostListParams>::try_from_uri(request.uri()).ok()?;
        PostQuery::from_params(&params)
            .ok()
            .map(|query| query.discriminator())
    })
}
