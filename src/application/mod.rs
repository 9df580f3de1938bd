//! Application layer: services that order store writes, cache invalidation
//! and realtime emits.

pub mod effects;
pub mod error;
pub mod messages;
pub mod notifications;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod reviews;
pub mod users;
