//! Captured HTTP responses.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use thiserror::Error;

/// A fully-buffered response, replayed verbatim on a cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("failed to buffer response body: {0}")]
    Body(String),
}

/// Whether a handler response may be stored.
///
/// Only successful, cookie-free, non-streaming responses are cacheable.
pub fn should_store_response(response: &Response) -> bool {
    if !response.status().is_success() {
        return false;
    }

    if response.headers().contains_key(header::SET_COOKIE) {
        return false;
    }

    let streaming = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/event-stream"));

    !streaming
}

/// Buffer `response`, returning a rebuilt response carrying the same bytes
/// together with its cacheable copy.
pub async fn buffer_response(
    response: Response,
) -> Result<(Response, CachedResponse), (Response, BufferError)> {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let cached = CachedResponse::new(parts.status, &parts.headers, bytes.clone());
            let rebuilt = Response::from_parts(parts, Body::from(bytes));
            Ok((rebuilt, cached))
        }
        Err(error) => {
            let rebuilt = Response::from_parts(parts, Body::empty());
            Err((rebuilt, BufferError::Body(error.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    #[test]
    fn error_responses_are_not_stored() {
        let response = (StatusCode::NOT_FOUND, "missing").into_response();
        assert!(!should_store_response(&response));
    }

    #[test]
    fn responses_setting_cookies_are_not_stored() {
        let response = (
            StatusCode::OK,
            [(header::SET_COOKIE, "session=abc")],
            "body",
        )
            .into_response();
        assert!(!should_store_response(&response));
    }

    #[test]
    fn event_streams_are_not_stored() {
        let response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/event-stream")],
            "data: x\n\n",
        )
            .into_response();
        assert!(!should_store_response(&response));
    }

    #[tokio::test]
    async fn buffered_response_replays_identically() {
        let response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"id":1}"#,
        )
            .into_response();

        let (rebuilt, cached) = buffer_response(response)
            .await
            .expect("in-memory body buffers");

        let live = rebuilt
            .into_body()
            .collect()
            .await
            .expect("rebuilt body")
            .to_bytes();
        let replay = cached.clone().into_response();
        assert_eq!(
            replay.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        let replayed = replay
            .into_body()
            .collect()
            .await
            .expect("replayed body")
            .to_bytes();

        assert_eq!(live, replayed);
        assert_eq!(cached.status(), StatusCode::OK);
    }
}
