pub mod api;
mod middleware;
mod state;
pub mod ws;

pub use api::build_api_router;
pub use state::{AppComponents, AppState, RealtimeOptions};

use axum::{Router, http::StatusCode, middleware as axum_middleware, routing::get};

/// Full application router: JSON API, `/ws`, and a liveness probe.
pub fn build_router(state: AppState) -> Router {
    build_api_router(&state)
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(|| async { StatusCode::NO_CONTENT }))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
