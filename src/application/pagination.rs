//! Page-number pagination for post listings.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cache::field_discriminator;
use crate::domain::types::PostSort;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("limit must be between 1 and {MAX_PAGE_SIZE}")]
    InvalidLimit,
    #[error("invalid sort: {0}")]
    InvalidSort(String),
}

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub author: Option<Uuid>,
}

/// Validated listing query with defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: PostSort,
    pub author: Option<Uuid>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: PostSort::default(),
            author: None,
        }
    }
}

impl PostQuery {
    pub fn from_params(params: &PostListParams) -> Result<Self, PaginationError> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(PaginationError::InvalidPage);
        }
        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidLimit);
        }
        let sort = match params.sort.as_deref() {
            None | Some("") => PostSort::default(),
            Some(raw) => raw.parse().map_err(PaginationError::InvalidSort)?,
        };

        Ok(Self {
            page,
            limit,
            sort,
            author: params.author,
        })
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Cache discriminator; equal for every raw query that normalizes to
    /// the same listing.
    pub fn discriminator(&self) -> String {
        field_discriminator([
            ("author", self.author.map(|id| id.to_string())),
            ("limit", Some(self.limit.to_string())),
            ("page", Some(self.page.to_string())),
            ("sort", Some(self.sort.to_string())),
        ])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &PostQuery, total: u64) -> Self {
        let seen = query.offset() as u64 + items.len() as u64;
        Self {
            has_more: seen < total,
            items,
            page: query.page,
            limit: query.limit,
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            has_more: self.has_more,
        }
    }
}
