//! Post authoring: detail lookups, create/edit with images, and comments.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    application::{
        forms::{CommentForm, FormErrors, PostForm, ValidPost},
        repos::{
            CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostFilter,
            PostsRepo, RepoError, UpdatePostParams, UsersRepo,
        },
    },
    domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord},
    infra::uploads::{UploadStorage, UploadStorageError},
};

/// Directory under the media root that holds post images.
pub const POST_IMAGE_PREFIX: &str = "posts";

#[derive(Debug, Error)]
pub enum PostError {
    #[error("submitted form is invalid")]
    Invalid(FormErrors),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to store post image")]
    Storage(#[from] UploadStorageError),
}

pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    uploads: Arc<UploadStorage>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        uploads: Arc<UploadStorage>,
    ) -> Self {
        Self {
            posts,
            comments,
            groups,
            users,
            uploads,
        }
    }

    /// Find a post addressed as `/{username}/{post_id}/`.
    ///
    /// Returns `None` when either the user or the post does not exist. The
    /// post's actual author is not compared with `username` here; that is the
    /// job of the access guards.
    pub async fn locate(
        &self,
        username: &str,
        post_id: i64,
    ) -> Result<Option<PostRecord>, RepoError> {
        if self.users.find_user_by_username(username).await?.is_none() {
            return Ok(None);
        }
        self.posts.find_post(post_id).await
    }

    /// Gather what the read-only post page shows for an already located post.
    pub async fn detail(&self, post: PostRecord) -> Result<PostDetail, RepoError> {
        let comments = self.comments.list_comments(post.id).await?;
        let author_post_count = self
            .posts
            .count_posts(&PostFilter::Author(post.author.id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, RepoError> {
        self.groups.list_groups().await
    }

    pub async fn create_post(
        &self,
        author: &UserRecord,
        form: &PostForm,
    ) -> Result<PostRecord, PostError> {
        let valid = self.validate(form).await?;
        let image = self.store_image(&valid).await?;

        let post = self
            .posts
            .create_post(CreatePostParams {
                author_id: author.id,
                text: valid.text,
                group_id: valid.group_id,
                image,
            })
            .await?;

        info!(
            target = "yatube::posts",
            post_id = post.id,
            author = %post.author,
            "post created"
        );
        Ok(post)
    }

    /// Apply an edit. A new image replaces the old one; `clear_image` drops it.
    pub async fn update_post(
        &self,
        post: &PostRecord,
        form: &PostForm,
    ) -> Result<PostRecord, PostError> {
        let valid = self.validate(form).await?;
        let image = match self.store_image(&valid).await? {
            Some(path) => Some(path),
            None if valid.clear_image => None,
            None => post.image.clone(),
        };

        let updated = self
            .posts
            .update_post(UpdatePostParams {
                id: post.id,
                text: valid.text,
                group_id: valid.group_id,
                image,
            })
            .await?;

        info!(
            target = "yatube::posts",
            post_id = updated.id,
            "post updated"
        );
        Ok(updated)
    }

    pub async fn add_comment(
        &self,
        author: &UserRecord,
        post: &PostRecord,
        form: &CommentForm,
    ) -> Result<CommentRecord, PostError> {
        let text = form.validate().map_err(PostError::Invalid)?;
        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: author.id,
                text,
            })
            .await?;
        Ok(comment)
    }

    async fn validate(&self, form: &PostForm) -> Result<ValidPost, PostError> {
        let groups = self.groups.list_groups().await?;
        form.validate(&groups).map_err(PostError::Invalid)
    }

    async fn store_image(&self, valid: &ValidPost) -> Result<Option<String>, PostError> {
        match &valid.image {
            Some(upload) => {
                let stored_path = self
                    .uploads
                    .store(
                        POST_IMAGE_PREFIX,
                        &upload.filename,
                        upload.extension,
                        upload.bytes.clone(),
                    )
                    .await?;
                Ok(Some(stored_path))
            }
            None => Ok(None),
        }
    }
}
