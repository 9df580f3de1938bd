use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{PostRecord, UserRecord};

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewCreateRequest {
    pub rating: u8,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageSendRequest {
    pub recipient_id: Uuid,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    pub review_count: u32,
    pub average_rating: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PostRecord> for PostResponse {
    fn from(post: PostRecord) -> Self {
        Self {
            like_count: post.like_count(),
            average_rating: post.average_rating(),
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            body: post.body,
            tags: post.tags,
            likes: post.likes,
            review_count: post.review_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub follower_count: usize,
    pub following_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            follower_count: user.followers.len(),
            following_count: user.following.len(),
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            bio: user.bio,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub post: PostResponse,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub user: UserResponse,
    pub following: bool,
}
