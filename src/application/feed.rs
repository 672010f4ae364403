//! Paginated post feeds: index, group, profile and subscriptions.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    application::{
        pagination::{POSTS_PER_PAGE, Page, PageRequest, Paginator},
        repos::{FollowsRepo, GroupsRepo, PostFilter, PostsRepo, RepoError, UsersRepo},
    },
    domain::{
        entities::{GroupRecord, PostRecord, UserRecord},
        follows::FollowEdge,
    },
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostRecord>,
}

pub struct ProfileFeed {
    pub author: UserRecord,
    pub page: Page<PostRecord>,
    pub followers: u64,
    pub following: u64,
    /// Whether the viewer currently follows this author.
    pub viewer_follows: bool,
    /// Whether the viewer may follow this author (signed in, not themselves).
    pub can_follow: bool,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            follows,
        }
    }

    pub async fn index(&self, request: PageRequest) -> Result<Page<PostRecord>, FeedError> {
        Ok(self.paginate(PostFilter::All, request).await?)
    }

    pub async fn group(&self, slug: &str, request: PageRequest) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::UnknownGroup(slug.to_string()))?;
        let page = self.paginate(PostFilter::Group(group.id), request).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile(
        &self,
        username: &str,
        request: PageRequest,
        viewer: Option<&UserRecord>,
    ) -> Result<ProfileFeed, FeedError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| FeedError::UnknownAuthor(username.to_string()))?;

        let page = self.paginate(PostFilter::Author(author.id), request).await?;
        let followers = self.follows.count_followers(author.id).await?;
        let following = self.follows.count_following(author.id).await?;

        let edge = viewer.and_then(|viewer| FollowEdge::new(viewer.id, author.id));
        let viewer_follows = match edge {
            Some(edge) => self.follows.is_following(edge).await?,
            None => false,
        };

        Ok(ProfileFeed {
            author,
            page,
            followers,
            following,
            viewer_follows,
            can_follow: edge.is_some(),
        })
    }

    /// Posts by every author the viewer follows.
    pub async fn followed(
        &self,
        viewer: &UserRecord,
        request: PageRequest,
    ) -> Result<Page<PostRecord>, FeedError> {
        let authors = self.follows.followed_author_ids(viewer.id).await?;
        Ok(self.paginate(PostFilter::Authors(authors), request).await?)
    }

    async fn paginate(
        &self,
        filter: PostFilter,
        request: PageRequest,
    ) -> Result<Page<PostRecord>, RepoError> {
        let total = self.posts.count_posts(&filter).await?;
        let window = Paginator::new(total, POSTS_PER_PAGE).window(request);
        let items = self
            .posts
            .list_posts(&filter, window.offset, window.limit)
            .await?;
        Ok(Page::new(window, items))
    }
}
