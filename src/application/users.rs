use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::effects::Effects;
use crate::application::error::AppError;
use crate::application::repos::{CreateUserParams, UsersRepo};
use crate::cache::Mutation;
use crate::domain::entities::UserRecord;
use crate::domain::types::{NotificationKind, ToggleOutcome};
use crate::domain::validation::{BODY_MAX_CHARS, TITLE_MAX_CHARS, required_text};

#[derive(Debug, Clone)]
pub struct RegisterUserCommand {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    effects: Effects,
}

impl UserService {
    pub fn new(users: Arc<dyn UsersRepo>, effects: Effects) -> Self {
        Self { users, effects }
    }

    pub async fn get(&self, id: Uuid) -> Result<UserRecord, AppError> {
        require_user(self.users.as_ref(), id).await
    }

    pub async fn register(&self, command: RegisterUserCommand) -> Result<UserRecord, AppError> {
        let username = required_text("username", &command.username, TITLE_MAX_CHARS)?;
        if username.contains(char::is_whitespace) {
            return Err(AppError::validation("username must not contain whitespace"));
        }
        let display_name = match command.display_name.as_deref() {
            Some(name) => required_text("display_name", name, TITLE_MAX_CHARS)?,
            None => username.clone(),
        };
        let bio = command
            .bio
            .as_deref()
            .filter(|bio| !bio.trim().is_empty())
            .map(|bio| required_text("bio", bio, BODY_MAX_CHARS))
            .transpose()?;

        let user = self
            .users
            .create_user(CreateUserParams {
                username,
                display_name,
                bio,
            })
            .await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Follow or unfollow `followee_id` as `follower_id`. Returns the
    /// followee's updated profile.
    pub async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<(UserRecord, ToggleOutcome), AppError> {
        if follower_id == followee_id {
            return Err(AppError::validation("users cannot follow themselves"));
        }

        let toggle = self.users.toggle_follow(follower_id, followee_id).await?;

        self.effects.invalidate(&Mutation::FollowToggled {
            follower_id,
            followee_id,
        });
        if toggle.outcome.is_added() {
            self.effects
                .notify(followee_id, follower_id, NotificationKind::Follow, None)
                .await;
        }

        Ok((toggle.followee, toggle.outcome))
    }
}

pub(crate) async fn require_user(users: &dyn UsersRepo, id: Uuid) -> Result<UserRecord, AppError> {
    users
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))
}
