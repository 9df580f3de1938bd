//! Targeted and broadcast event delivery.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::RealtimeEvent;
use super::registry::{ConnectionHandle, ConnectionRegistry, DeliveryError};

/// Pushes named events to live connections.
///
/// Delivery is best effort: an offline user gets nothing, nothing is queued,
/// and a failed handle never fails the caller.
#[derive(Debug, Clone)]
pub struct RealtimeFanout {
    registry: Arc<ConnectionRegistry>,
}

impl RealtimeFanout {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver to every connection `user_id` has open. Returns the number of
    /// handles that accepted the event.
    pub fn emit_to_user(&self, user_id: Uuid, event: &str, payload: Value) -> usize {
        let handles = self.registry.handles_for(user_id);
        if handles.is_empty() {
            debug!(user_id = %user_id, event, "user offline, event dropped");
            return 0;
        }
        self.deliver_all(&handles, RealtimeEvent::new(event, payload))
    }

    /// Deliver to every registered connection.
    pub fn broadcast(&self, event: &str, payload: Value) -> usize {
        let handles = self.registry.all_handles();
        if handles.is_empty() {
            return 0;
        }
        self.deliver_all(&handles, RealtimeEvent::new(event, payload))
    }

    /// [`emit_to_user`](Self::emit_to_user) for any serializable payload.
    pub fn emit_serialized<T: Serialize>(&self, user_id: Uuid, event: &str, payload: &T) -> usize {
        match serde_json::to_value(payload) {
            Ok(value) => self.emit_to_user(user_id, event, value),
            Err(err) => {
                warn!(user_id = %user_id, event, error = %err, "failed to serialize realtime payload");
                0
            }
        }
    }

    /// [`broadcast`](Self::broadcast) for any serializable payload.
    pub fn broadcast_serialized<T: Serialize>(&self, event: &str, payload: &T) -> usize {
        match serde_json::to_value(payload) {
            Ok(value) => self.broadcast(event, value),
            Err(err) => {
                warn!(event, error = %err, "failed to serialize realtime payload");
                0
            }
        }
    }

    fn deliver_all(&self, handles: &[ConnectionHandle], event: RealtimeEvent) -> usize {
        let mut delivered = 0;
        for handle in handles {
            match handle.deliver(event.clone()) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::Closed) => {
                    counter!("chorus_realtime_dropped_total", "reason" => "closed").increment(1);
                    debug!(connection = %handle.id(), event = %event.event, "pruning closed connection");
                    self.registry.unregister(handle.id());
                }
                Err(DeliveryError::Full) => {
                    counter!("chorus_realtime_dropped_total", "reason" => "full").increment(1);
                    warn!(connection = %handle.id(), event = %event.event, "connection buffer full, event dropped");
                }
            }
        }
        counter!("chorus_realtime_delivered_total").increment(delivered as u64);
        delivered
    }
}
