//! Per-user connection registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use metrics::gauge;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::RealtimeEvent;
use crate::cache::{rw_read, rw_write};

const COMPONENT: &str = "connection_registry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection closed")]
    Closed,
    #[error("connection buffer full")]
    Full,
}

/// Sending half of one live connection. The socket task owns the receiver.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<RealtimeEvent>,
}

impl ConnectionHandle {
    /// Create a handle with a bounded outbound buffer.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<RealtimeEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                id: ConnectionId::new(),
                tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event without waiting; a slow consumer loses the event.
    pub fn deliver(&self, event: RealtimeEvent) -> Result<(), DeliveryError> {
        self.tx.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
        })
    }

}

type UserConnections = HashMap<ConnectionId, ConnectionHandle>;

/// Maps a user to the handles of every socket they have open.
///
/// Not persisted: a restart starts empty and clients reconnect.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: RwLock<HashMap<Uuid, UserConnections>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, user_id: Uuid, handle: ConnectionHandle) {
        let total = {
            let mut users = rw_write(&self.users, COMPONENT, "register");
            users.entry(user_id).or_default().insert(handle.id, handle);
            connection_total(&users)
        };
        gauge!("chorus_realtime_connections").set(total as f64);
    }

    /// Remove a connection from whichever user owns it. A user whose last
    /// connection closes is dropped from the map.
    ///
    /// Returns the owning user when the connection was registered.
    pub fn unregister(&self, connection: ConnectionId) -> Option<Uuid> {
        let (owner, total) = {
            let mut users = rw_write(&self.users, COMPONENT, "unregister");
            let owner = users
                .iter_mut()
                .find_map(|(user_id, handles)| handles.remove(&connection).map(|_| *user_id));
            if let Some(user_id) = owner
                && users.get(&user_id).is_some_and(HashMap::is_empty)
            {
                users.remove(&user_id);
            }
            (owner, connection_total(&users))
        };
        gauge!("chorus_realtime_connections").set(total as f64);
        owner
    }

    /// Snapshot of the user's handles. Callers deliver without holding the lock.
    pub fn handles_for(&self, user_id: Uuid) -> Vec<ConnectionHandle> {
        let users = rw_read(&self.users, COMPONENT, "handles_for");
        users
            .get(&user_id)
            .map(|handles| handles.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all_handles(&self) -> Vec<ConnectionHandle> {
        let users = rw_read(&self.users, COMPONENT, "all_handles");
        users
            .values()
            .flat_map(|handles| handles.values().cloned())
            .collect()
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        rw_read(&self.users, COMPONENT, "is_online").contains_key(&user_id)
    }

    pub fn user_count(&self) -> usize {
        rw_read(&self.users, COMPONENT, "user_count").len()
    }

    pub fn connection_count(&self) -> usize {
        connection_total(&rw_read(&self.users, COMPONENT, "connection_count"))
    }
}

fn connection_total(users: &HashMap<Uuid, UserConnections>) -> usize {
    users.values().map(HashMap::len).sum()
}
