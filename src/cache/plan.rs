//! Mutation → invalidation mapping.
//!
//! There is no dependency tracking between namespaces: this table is the one
//! place that decides which cached responses a write makes stale. Every new
//! mutation gets a variant here and a test in this module.

use std::fmt;

use uuid::Uuid;

use super::keys::Namespace;

/// Writes that can make cached responses stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PostCreated { post_id: Uuid, author_id: Uuid },
    PostDeleted { post_id: Uuid, author_id: Uuid },
    /// Like lists are embedded in both the post and every listing sorted by likes.
    PostLikeToggled { post_id: Uuid },
    FollowToggled { follower_id: Uuid, followee_id: Uuid },
    ReviewCreated { post_id: Uuid },
    MessageSent,
    NotificationRead,
}

/// One cache deletion: a single key when `id` is set, the whole namespace
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub namespace: Namespace,
    pub id: Option<String>,
}

impl Invalidation {
    pub fn key(namespace: Namespace, id: impl ToString) -> Self {
        Self {
            namespace,
            id: Some(id.to_string()),
        }
    }

    pub fn namespace(namespace: Namespace) -> Self {
        Self {
            namespace,
            id: None,
        }
    }
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{id}", self.namespace),
            None => write!(f, "{}:*", self.namespace),
        }
    }
}

/// Ordered list of deletions for one mutation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub targets: Vec<Invalidation>,
}

impl InvalidationPlan {
    pub fn for_mutation(mutation: &Mutation) -> Self {
        let targets = match mutation {
            Mutation::PostCreated { author_id, .. } => vec![
                Invalidation::namespace(Namespace::Posts),
                Invalidation::key(Namespace::User, author_id),
            ],
            Mutation::PostDeleted { post_id, author_id } => vec![
                Invalidation::key(Namespace::Post, post_id),
                Invalidation::namespace(Namespace::Posts),
                Invalidation::key(Namespace::Reviews, post_id),
                Invalidation::key(Namespace::User, author_id),
            ],
            Mutation::PostLikeToggled { post_id } => vec![
                Invalidation::key(Namespace::Post, post_id),
                Invalidation::namespace(Namespace::Posts),
            ],
            Mutation::FollowToggled {
                follower_id,
                followee_id,
            } => vec![
                Invalidation::key(Namespace::User, follower_id),
                Invalidation::key(Namespace::User, followee_id),
            ],
            Mutation::ReviewCreated { post_id } => vec![
                Invalidation::key(Namespace::Reviews, post_id),
                Invalidation::key(Namespace::Post, post_id),
                Invalidation::namespace(Namespace::Posts),
            ],
            Mutation::MessageSent | Mutation::NotificationRead => Vec::new(),
        };

        Self { targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.targets.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(mutation: Mutation) -> Vec<String> {
        InvalidationPlan::for_mutation(&mutation)
            .targets
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn post_created_invalidates_listings_and_author_profile() {
        let post = Uuid::new_v4();
        let author = Uuid::new_v4();
        assert_eq!(
            rendered(Mutation::PostCreated {
                post_id: post,
                author_id: author
            }),
            vec!["posts:*".to_string(), format!("user:{author}")]
        );
    }

    #[test]
    fn post_deleted_invalidates_post_listings_reviews_and_author() {
        let post = Uuid::new_v4();
        let author = Uuid::new_v4();
        assert_eq!(
            rendered(Mutation::PostDeleted {
                post_id: post,
                author_id: author
            }),
            vec![
                format!("post:{post}"),
                "posts:*".to_string(),
                format!("reviews:{post}"),
                format!("user:{author}"),
            ]
        );
    }

    #[test]
    fn like_invalidates_single_post_and_all_listings() {
        let post = Uuid::new_v4();
        assert_eq!(
            rendered(Mutation::PostLikeToggled { post_id: post }),
            vec![format!("post:{post}"), "posts:*".to_string()]
        );
    }

    #[test]
    fn follow_invalidates_both_profiles() {
        let follower = Uuid::new_v4();
        let followee = Uuid::new_v4();
        assert_eq!(
            rendered(Mutation::FollowToggled {
                follower_id: follower,
                followee_id: followee
            }),
            vec![format!("user:{follower}"), format!("user:{followee}")]
        );
    }

    #[test]
    fn review_invalidates_reviews_post_and_listings() {
        let post = Uuid::new_v4();
        assert_eq!(
            rendered(Mutation::ReviewCreated { post_id: post }),
            vec![
                format!("reviews:{post}"),
                format!("post:{post}"),
                "posts:*".to_string()
            ]
        );
    }

    #[test]
    fn uncached_mutations_invalidate_nothing() {
        assert!(InvalidationPlan::for_mutation(&Mutation::MessageSent).is_empty());
        assert!(InvalidationPlan::for_mutation(&Mutation::NotificationRead).is_empty());
    }
}
