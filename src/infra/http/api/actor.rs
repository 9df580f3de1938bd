//! Acting-user extraction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;

pub const ACTOR_HEADER: &str = "x-user-id";

/// User on whose behalf a write is performed, read from `x-user-id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::unauthorized(Some(format!("missing `{ACTOR_HEADER}` header"))))?;
        let value = raw
            .to_str()
            .map_err(|_| ApiError::unauthorized(Some(format!("`{ACTOR_HEADER}` is not ASCII"))))?;
        Uuid::parse_str(value.trim())
            .map(Actor)
            .map_err(|_| ApiError::unauthorized(Some(format!("`{ACTOR_HEADER}` is not a UUID"))))
    }
}
