//! Realtime WebSocket endpoint.
//!
//! The client opens `/ws` and must send `{"type":"authenticate","token":...}`
//! as its first frame within the handshake timeout. Once verified, the
//! connection is registered under that user and receives every event the
//! fan-out addresses to them, plus broadcasts.

use std::time::Duration;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::infra::http::state::AppState;
use crate::infra::identity::{SessionVerifier, VerifyError};
use crate::realtime::events::{CONNECTED, ERROR, PONG};
use crate::realtime::{ClientMessage, ConnectionHandle, RealtimeEvent};

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("no authenticate frame within {0:?}")]
    TimedOut(Duration),
    #[error("connection closed before authenticating")]
    Closed,
    #[error("first frame must be an authenticate message")]
    UnexpectedFrame,
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let user_id = match authenticate(
        &mut receiver,
        state.verifier.as_ref(),
        state.realtime.handshake_timeout,
    )
    .await
    {
        Ok(user_id) => user_id,
        Err(err) => {
            warn!(
                target: "chorus::realtime::ws",
                error = %err,
                "websocket handshake rejected"
            );
            let rejection = RealtimeEvent::new(ERROR, json!({ "message": err.to_string() }));
            let _ = send_event(&mut sender, &rejection).await;
            let _ = sender.close().await;
            return;
        }
    };

    let (handle, mut outbound) = ConnectionHandle::channel(state.realtime.connection_buffer);
    let connection = handle.id();
    state.registry.register(user_id, handle);
    info!(
        target: "chorus::realtime::ws",
        user_id = %user_id,
        connection = %connection,
        "websocket connected"
    );

    let connected = RealtimeEvent::new(
        CONNECTED,
        json!({ "user_id": user_id, "connection_id": connection.to_string() }),
    );
    if send_event(&mut sender, &connected).await.is_ok() {
        loop {
            tokio::select! {
                event = outbound.recv() => {
                    let Some(event) = event else { break };
                    if let Err(err) = send_event(&mut sender, &event).await {
                        debug!(connection = %connection, error = %err, "websocket send failed");
                        break;
                    }
                }
                frame = receiver.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = reply_to(text.as_str())
                                && send_event(&mut sender, &reply).await.is_err()
                            {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            debug!(connection = %connection, error = %err, "websocket receive failed");
                            break;
                        }
                    }
                }
            }
        }
    }

    state.registry.unregister(connection);
    info!(
        target: "chorus::realtime::ws",
        user_id = %user_id,
        connection = %connection,
        "websocket disconnected"
    );
}

/// Wait for the authenticate frame and resolve its token to a user.
///
/// Transport ping/pong frames are skipped; anything else before the
/// authenticate frame rejects the handshake.
pub async fn authenticate<S>(
    frames: &mut S,
    verifier: &dyn SessionVerifier,
    timeout: Duration,
) -> Result<Uuid, HandshakeError>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let token = tokio::time::timeout(timeout, first_token(frames))
        .await
        .map_err(|_| HandshakeError::TimedOut(timeout))??;
    Ok(verifier.verify(&token).await?)
}

async fn first_token<S>(frames: &mut S) -> Result<String, HandshakeError>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        match frames.next().await {
            Some(Ok(Message::Text(text))) => {
                return match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(ClientMessage::Authenticate { token }) => Ok(token),
                    _ => Err(HandshakeError::UnexpectedFrame),
                };
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Binary(_))) => return Err(HandshakeError::UnexpectedFrame),
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                return Err(HandshakeError::Closed);
            }
        }
    }
}

/// Reply for a client frame received after the handshake, if any.
fn reply_to(text: &str) -> Option<RealtimeEvent> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => Some(RealtimeEvent::new(PONG, json!({}))),
        Ok(ClientMessage::Authenticate { .. }) => None,
        Err(err) => Some(RealtimeEvent::new(
            ERROR,
            json!({ "message": format!("unrecognized frame: {err}") }),
        )),
    }
}

async fn send_event<S>(sender: &mut S, event: &RealtimeEvent) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let payload = event.to_json().map_err(axum::Error::new)?;
    sender.send(Message::Text(payload.into())).await
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::stream;

    use super::*;

    struct FixedVerifier(Uuid);

    #[async_trait]
    impl SessionVerifier for FixedVerifier {
        async fn verify(&self, token: &str) -> Result<Uuid, VerifyError> {
            if token == "good" {
                Ok(self.0)
            } else {
                Err(VerifyError::UnknownUser)
            }
        }
    }

    fn text(body: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(body.into()))
    }

    #[tokio::test]
    async fn authenticate_accepts_valid_token() {
        let user = Uuid::new_v4();
        let mut frames = stream::iter(vec![
            Ok(Message::Ping(Default::default())),
            text(r#"{"type":"authenticate","token":"good"}"#),
        ]);

        let resolved = authenticate(&mut frames, &FixedVerifier(user), Duration::from_secs(1))
            .await
            .expect("authenticated");
        assert_eq!(resolved, user);
    }

    #[tokio::test]
    async fn authenticate_rejects_unknown_token() {
        let mut frames = stream::iter(vec![text(r#"{"type":"authenticate","token":"bad"}"#)]);
        let result =
            authenticate(&mut frames, &FixedVerifier(Uuid::new_v4()), Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(HandshakeError::Verify(VerifyError::UnknownUser))
        ));
    }

    #[tokio::test]
    async fn authenticate_requires_authenticate_first() {
        let mut frames = stream::iter(vec![text(r#"{"type":"ping"}"#)]);
        let result =
            authenticate(&mut frames, &FixedVerifier(Uuid::new_v4()), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(HandshakeError::UnexpectedFrame)));
    }

    #[tokio::test]
    async fn authenticate_reports_early_close() {
        let mut frames = stream::iter(Vec::<Result<Message, axum::Error>>::new());
        let result =
            authenticate(&mut frames, &FixedVerifier(Uuid::new_v4()), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(HandshakeError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn authenticate_times_out_on_silent_client() {
        let mut frames = stream::pending::<Result<Message, axum::Error>>();
        let result =
            authenticate(&mut frames, &FixedVerifier(Uuid::new_v4()), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(HandshakeError::TimedOut(_))));
    }

    #[test]
    fn ping_gets_pong_and_garbage_gets_error() {
        let pong = reply_to(r#"{"type":"ping"}"#).expect("reply");
        assert_eq!(pong.event, PONG);

        let error = reply_to("not json").expect("reply");
        assert_eq!(error.event, ERROR);

        assert!(reply_to(r#"{"type":"authenticate","token":"again"}"#).is_none());
    }
}
