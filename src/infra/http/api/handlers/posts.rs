//! Post handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::pagination::{PostListParams, PostQuery};
use crate::application::posts::CreatePostCommand;
use crate::infra::http::api::actor::Actor;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{LikeResponse, PostCreateRequest, PostResponse};
use crate::infra::http::state::AppState;

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = PostQuery::from_params(&params).map_err(AppError::from)?;
    let page = state.posts.list(&query).await?;
    Ok(Json(page.map(PostResponse::from)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get(id).await?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn create_post(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreatePostCommand {
        title: payload.title,
        body: payload.body,
        tags: payload.tags,
    };
    let post = state.posts.create(actor, command).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete(actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (post, outcome) = state.posts.toggle_like(actor, id).await?;
    Ok(Json(LikeResponse {
        post: PostResponse::from(post),
        liked: outcome.is_added(),
    }))
}
