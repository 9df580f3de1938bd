//! Realtime wire frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NEW_NOTIFICATION: &str = "new-notification";
pub const NEW_MESSAGE: &str = "new-message";
pub const NEW_POST: &str = "new-post";
pub const POST_DELETED: &str = "post-deleted";
pub const CONNECTED: &str = "connected";
pub const PONG: &str = "pong";
pub const ERROR: &str = "error";

/// Server → client frame, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub event: String,
    pub data: Value,
}

impl RealtimeEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Client → server frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Authenticate { token: String },
    Ping,
}
