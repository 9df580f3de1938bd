//! User handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::users::RegisterUserCommand;
use crate::infra::http::api::actor::Actor;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{FollowResponse, RegisterUserRequest, UserResponse};
use crate::infra::http::state::AppState;

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .register(RegisterUserCommand {
            username: payload.username,
            display_name: payload.display_name,
            bio: payload.bio,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, outcome) = state.users.toggle_follow(actor, id).await?;
    Ok(Json(FollowResponse {
        user: UserResponse::from(user),
        following: outcome.is_added(),
    }))
}
