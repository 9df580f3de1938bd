//! Realtime fan-out over per-user WebSocket connections.
//!
//! The registry maps users to connection handles; [`RealtimeFanout`] delivers
//! named events to one user or to everyone. The socket loop lives in
//! `infra::http::ws`.

pub mod events;
mod fanout;
mod registry;

pub use events::{ClientMessage, RealtimeEvent};
pub use fanout::RealtimeFanout;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, DeliveryError};
