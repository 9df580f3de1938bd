//! Review handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::reviews::CreateReviewCommand;
use crate::infra::http::api::actor::Actor;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ReviewCreateRequest;
use crate::infra::http::state::AppState;

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.reviews.list(post_id).await?))
}

pub async fn create_review(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<ReviewCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .reviews
        .create(
            actor,
            post_id,
            CreateReviewCommand {
                rating: payload.rating,
                body: payload.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
