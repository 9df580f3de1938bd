//! In-process document store backing every repository trait.
//!
//! Each repository call takes the store lock once, so a single call is
//! atomic with respect to every other call. Like and follow toggles rely on
//! this: membership is flipped under the write lock instead of being
//! computed by the caller.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::pagination::PostQuery;
use crate::application::repos::{
    CreateMessageParams, CreateNotificationParams, CreatePostParams, CreateReviewParams,
    CreateUserParams, FollowToggle, LikeToggle, MessagesRepo, NotificationsRepo, PostsPage,
    PostsRepo, RepoError, ReviewsRepo, UsersRepo,
};
use crate::domain::entities::{
    MessageRecord, NotificationRecord, PostRecord, ReviewRecord, UserRecord,
};
use crate::domain::types::{PostSort, ToggleOutcome};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, UserRecord>,
    /// Insertion order doubles as creation order.
    posts: Vec<PostRecord>,
    reviews: Vec<ReviewRecord>,
    notifications: Vec<NotificationRecord>,
    messages: Vec<MessageRecord>,
}

impl Collections {
    fn post_mut(&mut self, id: Uuid) -> Result<&mut PostRecord, RepoError> {
        self.posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn toggle_member(members: &mut Vec<Uuid>, id: Uuid) -> ToggleOutcome {
    match members.iter().position(|member| *member == id) {
        Some(index) => {
            members.remove(index);
            ToggleOutcome::Removed
        }
        None => {
            members.push(id);
            ToggleOutcome::Added
        }
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(&self, query: &PostQuery) -> Result<PostsPage, RepoError> {
        let state = self.state.read().await;
        let mut matching: Vec<&PostRecord> = state
            .posts
            .iter()
            .filter(|post| query.author.is_none_or(|author| post.author_id == author))
            .collect();

        match query.sort {
            PostSort::Oldest => {}
            PostSort::Newest => matching.reverse(),
            PostSort::Likes => {
                matching.reverse();
                matching.sort_by_key(|post| std::cmp::Reverse(post.like_count()));
            }
        }

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset())
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(PostsPage { items, total })
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&params.author_id) {
            return Err(RepoError::Integrity {
                message: format!("author `{}` does not exist", params.author_id),
            });
        }

        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            id: Uuid::new_v4(),
            author_id: params.author_id,
            title: params.title,
            body: params.body,
            tags: params.tags,
            likes: Vec::new(),
            review_count: 0,
            rating_total: 0,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        let mut state = self.state.write().await;
        let index = state
            .posts
            .iter()
            .position(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        let removed = state.posts.remove(index);
        state.reviews.retain(|review| review.post_id != id);
        Ok(removed)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle, RepoError> {
        let mut state = self.state.write().await;
        let post = state.post_mut(post_id)?;
        let outcome = toggle_member(&mut post.likes, user_id);
        post.updated_at = OffsetDateTime::now_utc();
        Ok(LikeToggle {
            post: post.clone(),
            outcome,
        })
    }
}

#[async_trait]
impl UsersRepo for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|user| user.username.eq_ignore_ascii_case(&params.username))
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }

        let user = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            display_name: params.display_name,
            bio: params.bio,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
    ) -> Result<FollowToggle, RepoError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&follower_id) || !state.users.contains_key(&followee_id) {
            return Err(RepoError::NotFound);
        }

        let followee = state.users.get_mut(&followee_id).ok_or(RepoError::NotFound)?;
        let outcome = toggle_member(&mut followee.followers, follower_id);
        let followee = followee.clone();

        let follower = state.users.get_mut(&follower_id).ok_or(RepoError::NotFound)?;
        match outcome {
            ToggleOutcome::Added => follower.following.push(followee_id),
            ToggleOutcome::Removed => follower.following.retain(|id| *id != followee_id),
        }
        let follower = follower.clone();

        Ok(FollowToggle {
            follower,
            followee,
            outcome,
        })
    }
}

#[async_trait]
impl ReviewsRepo for MemoryStore {
    async fn list_reviews(&self, post_id: Uuid) -> Result<Vec<ReviewRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .filter(|review| review.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_review(&self, params: CreateReviewParams) -> Result<ReviewRecord, RepoError> {
        let mut state = self.state.write().await;
        if state
            .reviews
            .iter()
            .any(|review| review.post_id == params.post_id && review.author_id == params.author_id)
        {
            return Err(RepoError::Duplicate {
                constraint: "reviews_post_author_key".to_string(),
            });
        }

        let post = state.post_mut(params.post_id)?;
        post.review_count += 1;
        post.rating_total += u32::from(params.rating);

        let review = ReviewRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            rating: params.rating,
            body: params.body,
            created_at: OffsetDateTime::now_utc(),
        };
        state.reviews.push(review.clone());
        Ok(review)
    }
}

#[async_trait]
impl NotificationsRepo for MemoryStore {
    async fn create_notification(
        &self,
        params: CreateNotificationParams,
    ) -> Result<NotificationRecord, RepoError> {
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            recipient_id: params.recipient_id,
            actor_id: params.actor_id,
            kind: params.kind,
            post_id: params.post_id,
            read: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.state.write().await.notifications.push(record.clone());
        Ok(record)
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|record| record.recipient_id == recipient_id && !(unread_only && record.read))
            .cloned()
            .collect())
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<NotificationRecord, RepoError> {
        let mut state = self.state.write().await;
        let record = state
            .notifications
            .iter_mut()
            .find(|record| record.id == id && record.recipient_id == recipient_id)
            .ok_or(RepoError::NotFound)?;
        record.read = true;
        Ok(record.clone())
    }
}

#[async_trait]
impl MessagesRepo for MemoryStore {
    async fn create_message(
        &self,
        params: CreateMessageParams,
    ) -> Result<MessageRecord, RepoError> {
        let record = MessageRecord {
            id: Uuid::new_v4(),
            sender_id: params.sender_id,
            recipient_id: params.recipient_id,
            body: params.body,
            created_at: OffsetDateTime::now_utc(),
        };
        self.state.write().await.messages.push(record.clone());
        Ok(record)
    }

    async fn list_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Vec<MessageRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|message| {
                (message.sender_id == user_a && message.recipient_id == user_b)
                    || (message.sender_id == user_b && message.recipient_id == user_a)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> UserRecord {
        store
            .create_user(CreateUserParams {
                username: name.to_string(),
                display_name: name.to_string(),
                bio: None,
            })
            .await
            .expect("user created")
    }

    async fn post(store: &MemoryStore, author: Uuid, title: &str) -> PostRecord {
        store
            .create_post(CreatePostParams {
                author_id: author,
                title: title.to_string(),
                body: "body".to_string(),
                tags: Vec::new(),
            })
            .await
            .expect("post created")
    }

    #[tokio::test]
    async fn toggle_like_flips_membership() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let fan = user(&store, "fan").await;
        let created = post(&store, author.id, "hello").await;

        let liked = store.toggle_like(created.id, fan.id).await.expect("toggle");
        assert_eq!(liked.outcome, ToggleOutcome::Added);
        assert_eq!(liked.post.likes, vec![fan.id]);

        let unliked = store.toggle_like(created.id, fan.id).await.expect("toggle");
        assert_eq!(unliked.outcome, ToggleOutcome::Removed);
        assert!(unliked.post.likes.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_likes_from_different_users_are_all_kept() {
        let store = Arc::new(MemoryStore::new());
        let author = user(&store, "author").await;
        let created = post(&store, author.id, "popular").await;

        let mut likers = Vec::new();
        for i in 0..32 {
            likers.push(user(&store, &format!("fan{i}")).await.id);
        }

        let tasks: Vec<_> = likers
            .iter()
            .map(|liker| {
                let store = store.clone();
                let liker = *liker;
                tokio::spawn(async move { store.toggle_like(created.id, liker).await })
            })
            .collect();
        for task in tasks {
            task.await.expect("join").expect("toggle");
        }

        let stored = store.find_post(created.id).await.expect("read").expect("exists");
        assert_eq!(stored.like_count(), likers.len());
    }

    #[tokio::test]
    async fn listing_sorts_by_likes_then_newest() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let fan = user(&store, "fan").await;
        let first = post(&store, author.id, "first").await;
        let second = post(&store, author.id, "second").await;
        let third = post(&store, author.id, "third").await;
        store.toggle_like(first.id, fan.id).await.expect("toggle");

        let query = PostQuery {
            sort: PostSort::Likes,
            ..Default::default()
        };
        let page = store.list_posts(&query).await.expect("list");
        let ids: Vec<Uuid> = page.items.iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![first.id, third.id, second.id]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn follow_updates_both_sides() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let toggle = store.toggle_follow(alice.id, bob.id).await.expect("toggle");
        assert_eq!(toggle.outcome, ToggleOutcome::Added);
        assert_eq!(toggle.follower.following, vec![bob.id]);
        assert_eq!(toggle.followee.followers, vec![alice.id]);

        let toggle = store.toggle_follow(alice.id, bob.id).await.expect("toggle");
        assert_eq!(toggle.outcome, ToggleOutcome::Removed);
        assert!(toggle.follower.following.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_reviews() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let critic = user(&store, "critic").await;
        let created = post(&store, author.id, "reviewed").await;
        store
            .create_review(CreateReviewParams {
                post_id: created.id,
                author_id: critic.id,
                rating: 4,
                body: "good".to_string(),
            })
            .await
            .expect("review");

        store.delete_post(created.id).await.expect("delete");
        assert!(store.list_reviews(created.id).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn duplicate_usernames_rejected() {
        let store = MemoryStore::new();
        user(&store, "alice").await;
        let err = store
            .create_user(CreateUserParams {
                username: "ALICE".to_string(),
                display_name: "Alice".to_string(),
                bio: None,
            })
            .await
            .expect_err("duplicate");
        assert!(matches!(err, RepoError::Duplicate { .. }));
    }
}
