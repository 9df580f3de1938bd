//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PostQuery;
use crate::domain::entities::{
    MessageRecord, NotificationRecord, PostRecord, ReviewRecord, UserRecord,
};
use crate::domain::types::{NotificationKind, ToggleOutcome};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateReviewParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub rating: u8,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct CreateNotificationParams {
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreateMessageParams {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct PostsPage {
    pub items: Vec<PostRecord>,
    pub total: u64,
}

/// Post state after a like toggle committed.
#[derive(Debug, Clone)]
pub struct LikeToggle {
    pub post: PostRecord,
    pub outcome: ToggleOutcome,
}

/// Both profiles after a follow toggle committed.
#[derive(Debug, Clone)]
pub struct FollowToggle {
    pub follower: UserRecord,
    pub followee: UserRecord,
    pub outcome: ToggleOutcome,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(&self, query: &PostQuery) -> Result<PostsPage, RepoError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Removes the post together with its reviews; returns the removed post.
    async fn delete_post(&self, id: Uuid) -> Result<PostRecord, RepoError>;

    /// Adds `user_id` to the post's likes or removes it, as one store
    /// operation. Concurrent toggles by different users never lose updates.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    /// Updates both membership lists in one store operation.
    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<FollowToggle, RepoError>;
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    async fn list_reviews(&self, post_id: Uuid) -> Result<Vec<ReviewRecord>, RepoError>;

    /// Stores the review and bumps the post's rating counters.
    async fn create_review(&self, params: CreateReviewParams) -> Result<ReviewRecord, RepoError>;
}

#[async_trait]
pub trait NotificationsRepo: Send + Sync {
    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError>;

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, RepoError>;

    /// Fails with `NotFound` when the notification belongs to someone else.
    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<NotificationRecord, RepoError>;
}

#[async_trait]
pub trait MessagesRepo: Send + Sync {
    async fn create_message(&self, params: CreateMessageParams)
    -> Result<MessageRecord, RepoError>;

    async fn list_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Vec<MessageRecord>, RepoError>;
}
