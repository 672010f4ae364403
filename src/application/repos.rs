//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use crate::domain::follows::FollowEdge;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Selects the posts that make up a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by any of the listed authors; an empty list selects nothing.
    Authors(Vec<i64>),
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub token_hash: Vec<u8>,
    pub user_id: i64,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    /// Returns the user together with the stored password hash.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(UserRecord, String)>, RepoError>;

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    /// Posts newest first (publication date, then id).
    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post, newest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Insert the edge unless it exists; returns whether a row was created.
    async fn create_follow(&self, edge: FollowEdge) -> Result<bool, RepoError>;

    /// Returns whether a row was removed.
    async fn delete_follow(&self, edge: FollowEdge) -> Result<bool, RepoError>;

    async fn is_following(&self, edge: FollowEdge) -> Result<bool, RepoError>;

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError>;

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError>;

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: CreateSessionParams) -> Result<(), RepoError>;

    /// Resolve an unexpired session to its user.
    async fn find_session_user(
        &self,
        token_hash: &[u8],
        now: OffsetDateTime,
    ) -> Result<Option<UserRecord>, RepoError>;

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}

/// Every persistence port the service needs, implemented by one backend.
pub trait Repositories:
    UsersRepo
    + GroupsRepo
    + PostsRepo
    + CommentsRepo
    + FollowsRepo
    + SessionsRepo
    + HealthRepo
    + 'static
{
}

impl<T> Repositories for T where
    T: UsersRepo
        + GroupsRepo
        + PostsRepo
        + CommentsRepo
        + FollowsRepo
        + SessionsRepo
        + HealthRepo
        + 'static
{
}
