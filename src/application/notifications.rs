use std::sync::Arc;

use uuid::Uuid;

use crate::application::effects::Effects;
use crate::application::error::AppError;
use crate::application::repos::NotificationsRepo;
use crate::cache::Mutation;
use crate::domain::entities::NotificationRecord;

#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationsRepo>,
    effects: Effects,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationsRepo>, effects: Effects) -> Self {
        Self {
            notifications,
            effects,
        }
    }

    pub async fn list(
        &self,
        actor: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, AppError> {
        Ok(self
            .notifications
            .list_notifications(actor, unread_only)
            .await?)
    }

    pub async fn mark_read(&self, actor: Uuid, id: Uuid) -> Result<NotificationRecord, AppError> {
        let record = self.notifications.mark_read(id, actor).await?;
        self.effects.invalidate(&Mutation::NotificationRead);
        Ok(record)
    }
}
