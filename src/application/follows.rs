//! Follow and unfollow actions.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::{
    application::repos::{FollowsRepo, RepoError, UsersRepo},
    domain::{entities::UserRecord, follows::FollowEdge},
};

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Subscribe the viewer to `username`; returns whether a new edge was stored.
    ///
    /// Following an existing subscription is a no-op and following oneself is
    /// silently ignored.
    pub async fn follow(&self, viewer: &UserRecord, username: &str) -> Result<bool, FollowError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FollowError::UnknownAuthor(username.to_string()))?;

        let Some(edge) = FollowEdge::new(viewer.id, author.id) else {
            debug!(
                target = "yatube::follows",
                user = %viewer,
                "ignoring self-follow"
            );
            return Ok(false);
        };

        Ok(self.follows.create_follow(edge).await?)
    }

    /// Remove the viewer's subscription to `username`, if any.
    pub async fn unfollow(&self, viewer: &UserRecord, username: &str) -> Result<bool, FollowError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FollowError::UnknownAuthor(username.to_string()))?;
        match FollowEdge::new(viewer.id, author.id) {
            Some(edge) => Ok(self.follows.delete_follow(edge).await?),
            None => Ok(false),
        }
    }
}
