//! Post-commit side effects shared by every mutation.
//!
//! Services call these only after the store write succeeded, in the order
//! store write, cache invalidation, realtime emit. None of them can fail the
//! caller.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::{CreateNotificationParams, NotificationsRepo};
use crate::cache::{InvalidationBus, Mutation};
use crate::domain::entities::NotificationRecord;
use crate::domain::types::NotificationKind;
use crate::realtime::{RealtimeFanout, events};

#[derive(Clone)]
pub struct Effects {
    bus: InvalidationBus,
    fanout: RealtimeFanout,
    notifications: Arc<dyn NotificationsRepo>,
}

impl Effects {
    pub fn new(
        bus: InvalidationBus,
        fanout: RealtimeFanout,
        notifications: Arc<dyn NotificationsRepo>,
    ) -> Self {
        Self {
            bus,
            fanout,
            notifications,
        }
    }

    pub fn invalidate(&self, mutation: &Mutation) -> usize {
        self.bus.apply(mutation)
    }

    pub fn emit_to_user<T: Serialize>(&self, user_id: Uuid, event: &str, payload: &T) -> usize {
        self.fanout.emit_serialized(user_id, event, payload)
    }

    pub fn broadcast<T: Serialize>(&self, event: &str, payload: &T) -> usize {
        self.fanout.broadcast_serialized(event, payload)
    }

    /// Persist a notification for `recipient_id` and push it live.
    ///
    /// Self-notifications are skipped. A failed insert is logged and the
    /// emit is skipped with it, since the event must carry the stored record.
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        actor_id: Uuid,
        kind: NotificationKind,
        post_id: Option<Uuid>,
    ) -> Option<NotificationRecord> {
        if recipient_id == actor_id {
            debug!(user_id = %actor_id, kind = kind.as_str(), "skipping self notification");
            return None;
        }

        let params = CreateNotificationParams {
            recipient_id,
            actor_id,
            kind,
            post_id,
        };
        match self.notifications.create_notification(params).await {
            Ok(record) => {
                self.emit_to_user(recipient_id, events::NEW_NOTIFICATION, &record);
                Some(record)
            }
            Err(err) => {
                warn!(
                    recipient_id = %recipient_id,
                    kind = kind.as_str(),
                    error = %err,
                    "failed to persist notification"
                );
                None
            }
        }
    }
}
