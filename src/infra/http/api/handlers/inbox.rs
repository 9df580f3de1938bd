//! Notification and direct message handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::messages::SendMessageCommand;
use crate::infra::http::api::actor::Actor;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{MessageSendRequest, NotificationListQuery};
use crate::infra::http::state::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        state.notifications.list(actor, query.unread_only).await?,
    ))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.notifications.mark_read(actor, id).await?))
}

pub async fn send_message(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<MessageSendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .messages
        .send(
            actor,
            SendMessageCommand {
                recipient_id: payload.recipient_id,
                body: payload.body,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn conversation(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(other): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.messages.conversation(actor, other).await?))
}
