use std::sync::Arc;

use uuid::Uuid;

use crate::application::effects::Effects;
use crate::application::error::AppError;
use crate::application::repos::{CreateReviewParams, PostsRepo, ReviewsRepo, UsersRepo};
use crate::application::users::require_user;
use crate::cache::Mutation;
use crate::domain::entities::ReviewRecord;
use crate::domain::types::NotificationKind;
use crate::domain::validation::{REVIEW_MAX_CHARS, rating, required_text};

#[derive(Debug, Clone)]
pub struct CreateReviewCommand {
    pub rating: u8,
    pub body: String,
}

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewsRepo>,
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    effects: Effects,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewsRepo>,
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
        effects: Effects,
    ) -> Self {
        Self {
            reviews,
            posts,
            users,
            effects,
        }
    }

    pub async fn list(&self, post_id: Uuid) -> Result<Vec<ReviewRecord>, AppError> {
        if self.posts.find_post(post_id).await?.is_none() {
            return Err(AppError::not_found("post"));
        }
        Ok(self.reviews.list_reviews(post_id).await?)
    }

    pub async fn create(
        &self,
        actor: Uuid,
        post_id: Uuid,
        command: CreateReviewCommand,
    ) -> Result<ReviewRecord, AppError> {
        let rating = rating(command.rating)?;
        let body = required_text("body", &command.body, REVIEW_MAX_CHARS)?;
        require_user(self.users.as_ref(), actor).await?;
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("post"))?;

        let review = self
            .reviews
            .create_review(CreateReviewParams {
                post_id,
                author_id: actor,
                rating,
                body,
            })
            .await?;

        self.effects.invalidate(&Mutation::ReviewCreated { post_id });
        self.effects
            .notify(post.author_id, actor, NotificationKind::Review, Some(post_id))
            .await;

        Ok(review)
    }
}
