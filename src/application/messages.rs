use std::sync::Arc;

use uuid::Uuid;

use crate::application::effects::Effects;
use crate::application::error::AppError;
use crate::application::repos::{CreateMessageParams, MessagesRepo, UsersRepo};
use crate::application::users::require_user;
use crate::cache::Mutation;
use crate::domain::entities::MessageRecord;
use crate::domain::validation::{MESSAGE_MAX_CHARS, required_text};
use crate::realtime::events;

#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub recipient_id: Uuid,
    pub body: String,
}

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessagesRepo>,
    users: Arc<dyn UsersRepo>,
    effects: Effects,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessagesRepo>, users: Arc<dyn UsersRepo>, effects: Effects) -> Self {
        Self {
            messages,
            users,
            effects,
        }
    }

    pub async fn send(
        &self,
        actor: Uuid,
        command: SendMessageCommand,
    ) -> Result<MessageRecord, AppError> {
        if command.recipient_id == actor {
            return Err(AppError::validation("cannot message yourself"));
        }
        let body = required_text("body", &command.body, MESSAGE_MAX_CHARS)?;
        require_user(self.users.as_ref(), actor).await?;
        require_user(self.users.as_ref(), command.recipient_id).await?;

        let message = self
            .messages
            .create_message(CreateMessageParams {
                sender_id: actor,
                recipient_id: command.recipient_id,
                body,
            })
            .await?;

        self.effects.invalidate(&Mutation::MessageSent);
        self.effects
            .emit_to_user(message.recipient_id, events::NEW_MESSAGE, &message);

        Ok(message)
    }

    pub async fn conversation(
        &self,
        actor: Uuid,
        other: Uuid,
    ) -> Result<Vec<MessageRecord>, AppError> {
        Ok(self.messages.list_conversation(actor, other).await?)
    }
}
