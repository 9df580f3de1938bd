//! Resolves realtime handshake tokens to users.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{RepoError, UsersRepo};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token is malformed")]
    Malformed,
    #[error("token does not identify a known user")]
    UnknownUser,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Uuid, VerifyError>;
}

/// Treats the token as the user id and checks the user exists.
///
/// Stands in for session validation until an identity provider is wired in.
#[derive(Clone)]
pub struct UserIdVerifier {
    users: Arc<dyn UsersRepo>,
}

impl UserIdVerifier {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl SessionVerifier for UserIdVerifier {
    async fn verify(&self, token: &str) -> Result<Uuid, VerifyError> {
        let user_id = Uuid::parse_str(token.trim()).map_err(|_| VerifyError::Malformed)?;
        match self.users.find_user(user_id).await? {
            Some(user) => Ok(user.id),
            None => Err(VerifyError::UnknownUser),
        }
    }
}
