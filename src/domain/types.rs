//! Shared domain enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Follow,
    Review,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Follow => "follow",
            NotificationKind::Review => "review",
        }
    }
}

/// Ordering for post listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    #[default]
    Newest,
    Oldest,
    Likes,
}

impl PostSort {
    pub fn as_str(self) -> &'static str {
        match self {
            PostSort::Newest => "newest",
            PostSort::Oldest => "oldest",
            PostSort::Likes => "likes",
        }
    }
}

impl fmt::Display for PostSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostSort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" | "new" | "recent" => Ok(PostSort::Newest),
            "oldest" | "old" => Ok(PostSort::Oldest),
            "likes" | "popular" => Ok(PostSort::Likes),
            other => Err(format!("unknown sort `{other}`")),
        }
    }
}

/// Result of an atomic set-membership toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    pub fn is_added(self) -> bool {
        matches!(self, ToggleOutcome::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_sort_parses_aliases() {
        assert_eq!("popular".parse::<PostSort>(), Ok(PostSort::Likes));
        assert_eq!(" Newest ".parse::<PostSort>(), Ok(PostSort::Newest));
        assert!("random".parse::<PostSort>().is_err());
    }
}
