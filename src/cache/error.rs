use thiserror::Error;

/// Failure reported by a cache backend.
///
/// The in-process [`KeyedCache`](super::KeyedCache) never produces one; the
/// type exists for backends behind [`ResponseStore`](super::ResponseStore)
/// that can fail, and callers treat it as best-effort.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable during `{op}`: {message}")]
    Unavailable { op: &'static str, message: String },
}

impl CacheError {
    pub fn unavailable(op: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            op,
            message: message.into(),
        }
    }
}
