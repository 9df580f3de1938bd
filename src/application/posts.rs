use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::application::effects::Effects;
use crate::application::error::AppError;
use crate::application::pagination::{Page, PostQuery};
use crate::application::repos::{CreatePostParams, PostsRepo, UsersRepo};
use crate::application::users::require_user;
use crate::cache::Mutation;
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::domain::types::{NotificationKind, ToggleOutcome};
use crate::domain::validation::{BODY_MAX_CHARS, TITLE_MAX_CHARS, normalize_tags, required_text};
use crate::realtime::events;

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    effects: Effects,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostsRepo>, users: Arc<dyn UsersRepo>, effects: Effects) -> Self {
        Self {
            posts,
            users,
            effects,
        }
    }

    pub async fn list(&self, query: &PostQuery) -> Result<Page<PostRecord>, AppError> {
        let page = self.posts.list_posts(query).await?;
        Ok(Page::new(page.items, query, page.total))
    }

    pub async fn get(&self, id: Uuid) -> Result<PostRecord, AppError> {
        self.posts
            .find_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("post"))
    }

    pub async fn create(
        &self,
        actor: Uuid,
        command: CreatePostCommand,
    ) -> Result<PostRecord, AppError> {
        let title = required_text("title", &command.title, TITLE_MAX_CHARS)?;
        let body = required_text("body", &command.body, BODY_MAX_CHARS)?;
        let tags = normalize_tags(&command.tags)?;
        require_user(self.users.as_ref(), actor).await?;

        let post = self
            .posts
            .create_post(CreatePostParams {
                author_id: actor,
                title,
                body,
                tags,
            })
            .await?;
        info!(post_id = %post.id, author_id = %actor, "post created");

        self.effects.invalidate(&Mutation::PostCreated {
            post_id: post.id,
            author_id: post.author_id,
        });
        self.effects.broadcast(events::NEW_POST, &post);

        Ok(post)
    }

    /// Only the author may delete a post.
    pub async fn delete(&self, actor: Uuid, id: Uuid) -> Result<(), AppError> {
        let post = self.get(id).await?;
        if post.author_id != actor {
            return Err(DomainError::forbidden("only the author can delete a post").into());
        }

        let removed = self.posts.delete_post(id).await?;
        info!(post_id = %id, author_id = %actor, "post deleted");

        self.effects.invalidate(&Mutation::PostDeleted {
            post_id: removed.id,
            author_id: removed.author_id,
        });
        self.effects
            .broadcast(events::POST_DELETED, &json!({ "id": removed.id }));

        Ok(())
    }

    pub async fn toggle_like(
        &self,
        actor: Uuid,
        id: Uuid,
    ) -> Result<(PostRecord, ToggleOutcome), AppError> {
        require_user(self.users.as_ref(), actor).await?;
        let toggle = self.posts.toggle_like(id, actor).await?;

        self.effects
            .invalidate(&Mutation::PostLikeToggled { post_id: id });
        if toggle.outcome.is_added() {
            self.effects
                .notify(
                    toggle.post.author_id,
                    actor,
                    NotificationKind::Like,
                    Some(id),
                )
                .await;
        }

        Ok((toggle.post, toggle.outcome))
    }
}
