//! Cache diagnostics

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::cache::CacheStats;
use crate::infra::http::api::error::{ApiError, codes};
use crate::infra::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub realtime_users: usize,
    pub realtime_connections: usize,
}

pub async fn cache_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.responses.stats().map_err(|err| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::CACHE,
            "Cache unavailable",
            Some(err.to_string()),
        )
    })?;

    Ok(Json(CacheStatsResponse {
        enabled: state.cache.enabled,
        stats,
        realtime_users: state.registry.user_count(),
        realtime_connections: state.registry.connection_count(),
    }))
}
