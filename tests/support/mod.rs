//! In-memory repositories and a router harness for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use time::{Duration, OffsetDateTime, macros::datetime};
use tower::ServiceExt;

use yatube::{
    application::repos::{
        CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams,
        CreateSessionParams, CreateUserParams, FollowsRepo, GroupsRepo, HealthRepo, PostFilter,
        PostsRepo, RepoError, SessionsRepo, UpdatePostParams, UsersRepo,
    },
    cache::{CacheConfig, CacheState},
    domain::{
        entities::{CommentRecord, GroupRecord, PostRecord, UserRecord, UserSummary},
        follows::FollowEdge,
    },
    infra::{
        http::{AdminState, HttpState, SessionCookie, build_admin_router, build_router},
        uploads::UploadStorage,
    },
};

pub const SESSION_COOKIE: &str = "yatube_session";

/// Smallest valid GIF: 1x1, single colour.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04,
    0x01, 0x0a, 0x00, 0x01, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
    0x02, 0x4c, 0x01, 0x00, 0x3b,
];

const EPOCH: OffsetDateTime = datetime!(2021-01-01 00:00 UTC);

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

struct StoredPost {
    id: i64,
    author_id: i64,
    text: String,
    group_id: Option<i64>,
    image: Option<String>,
    pub_date: OffsetDateTime,
}

struct StoredComment {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created: OffsetDateTime,
}

struct StoredSession {
    token_hash: Vec<u8>,
    user_id: i64,
    expires_at: OffsetDateTime,
}

#[derive(Default)]
struct State {
    next_id: i64,
    users: Vec<StoredUser>,
    groups: Vec<GroupRecord>,
    posts: Vec<StoredPost>,
    comments: Vec<StoredComment>,
    follows: Vec<FollowEdge>,
    sessions: Vec<StoredSession>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_summary(&self, id: i64) -> Option<UserSummary> {
        self.users
            .iter()
            .find(|user| user.record.id == id)
            .map(|user| user.record.summary())
    }

    fn post_record(&self, post: &StoredPost) -> Result<PostRecord, RepoError> {
        let author = self
            .user_summary(post.author_id)
            .ok_or_else(|| RepoError::Integrity {
                message: format!("post {} has no author", post.id),
            })?;
        let group = post.group_id.and_then(|id| {
            self.groups
                .iter()
                .find(|group| group.id == id)
                .map(GroupRecord::summary)
        });
        Ok(PostRecord {
            id: post.id,
            text: post.text.clone(),
            pub_date: post.pub_date,
            author,
            group,
            image: post.image.clone(),
        })
    }

    fn matches(&self, post: &StoredPost, filter: &PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group_id == Some(*id),
            PostFilter::Author(id) => post.author_id == *id,
            PostFilter::Authors(ids) => ids.contains(&post.author_id),
        }
    }
}

/// Every repository trait over plain vectors.
#[derive(Default)]
pub struct InMemoryRepos {
    state: Mutex<State>,
}

impl InMemoryRepos {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("repository state lock")
    }

    pub fn insert_user(&self, username: &str) -> UserRecord {
        let mut state = self.state();
        let id = state.next_id();
        let record = UserRecord {
            id,
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{username}@example.com"),
            date_joined: EPOCH,
        };
        state.users.push(StoredUser {
            record: record.clone(),
            password_hash: "!".to_string(),
        });
        record
    }

    pub fn insert_group(&self, title: &str, slug: &str) -> GroupRecord {
        let mut state = self.state();
        let id = state.next_id();
        let group = GroupRecord {
            id,
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("All about {title}"),
        };
        state.groups.push(group.clone());
        group
    }

    /// Insert a post directly. Later inserts are published later.
    pub fn insert_post(&self, author: &UserRecord, text: &str, group: Option<&GroupRecord>) -> i64 {
        let mut state = self.state();
        let id = state.next_id();
        state.posts.push(StoredPost {
            id,
            author_id: author.id,
            text: text.to_string(),
            group_id: group.map(|group| group.id),
            image: None,
            pub_date: EPOCH + Duration::seconds(id),
        });
        id
    }

    pub fn delete_all_posts(&self) {
        let mut state = self.state();
        state.posts.clear();
        state.comments.clear();
    }

    pub fn post_count(&self) -> usize {
        self.state().posts.len()
    }

    pub fn latest_post(&self) -> Option<PostRecord> {
        let state = self.state();
        state
            .posts
            .iter()
            .max_by_key(|post| (post.pub_date, post.id))
            .and_then(|post| state.post_record(post).ok())
    }

    pub fn post(&self, id: i64) -> Option<PostRecord> {
        let state = self.state();
        state
            .posts
            .iter()
            .find(|post| post.id == id)
            .and_then(|post| state.post_record(post).ok())
    }

    pub fn comment_texts(&self, post_id: i64) -> Vec<String> {
        self.state()
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .map(|comment| comment.text.clone())
            .collect()
    }

    pub fn follow_count(&self) -> usize {
        self.state().follows.len()
    }

    pub fn follows(&self, user: &UserRecord, author: &UserRecord) -> bool {
        self.state()
            .follows
            .iter()
            .any(|edge| edge.user_id() == user.id && edge.author_id() == author.id)
    }
}

#[async_trait]
impl UsersRepo for InMemoryRepos {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| user.record.username == username)
            .map(|user| user.record.clone()))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(UserRecord, String)>, RepoError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| user.record.username == username)
            .map(|user| (user.record.clone(), user.password_hash.clone())))
    }

    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut state = self.state();
        if state
            .users
            .iter()
            .any(|user| user.record.username == params.username)
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let id = state.next_id();
        let record = UserRecord {
            id,
            username: params.username,
            first_name: params.first_name,
            last_name: params.last_name,
            email: params.email,
            date_joined: EPOCH,
        };
        state.users.push(StoredUser {
            record: record.clone(),
            password_hash: params.password_hash,
        });
        Ok(record)
    }
}

#[async_trait]
impl GroupsRepo for InMemoryRepos {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.state().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self
            .state()
            .groups
            .iter()
            .find(|group| group.slug == slug)
            .cloned())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut state = self.state();
        if state.groups.iter().any(|group| group.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "post_groups_slug_key".to_string(),
            });
        }
        let id = state.next_id();
        let group = GroupRecord {
            id,
            title: params.title,
            slug: params.slug,
            description: params.description,
        };
        state.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepos {
    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let state = self.state();
        Ok(state
            .posts
            .iter()
            .filter(|post| state.matches(post, filter))
            .count() as u64)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let state = self.state();
        let mut selected: Vec<&StoredPost> = state
            .posts
            .iter()
            .filter(|post| state.matches(post, filter))
            .collect();
        selected.sort_by(|a, b| (b.pub_date, b.id).cmp(&(a.pub_date, a.id)));
        selected
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|post| state.post_record(post))
            .collect()
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state();
        state
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|post| state.post_record(post))
            .transpose()
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state();
        let id = state.next_id();
        let post = StoredPost {
            id,
            author_id: params.author_id,
            text: params.text,
            group_id: params.group_id,
            image: params.image,
            pub_date: EPOCH + Duration::seconds(id),
        };
        let record = state.post_record(&post)?;
        state.posts.push(post);
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state();
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = params.group_id;
        post.image = params.image;

        let state = &*state;
        let post = state
            .posts
            .iter()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        state.post_record(post)
    }
}

#[async_trait]
impl CommentsRepo for InMemoryRepos {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let state = self.state();
        let mut comments: Vec<CommentRecord> = state
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .filter_map(|comment| {
                state.user_summary(comment.author_id).map(|author| CommentRecord {
                    id: comment.id,
                    post_id: comment.post_id,
                    author,
                    text: comment.text.clone(),
                    created: comment.created,
                })
            })
            .collect();
        comments.sort_by(|a, b| (b.created, b.id).cmp(&(a.created, a.id)));
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut state = self.state();
        if !state.posts.iter().any(|post| post.id == params.post_id) {
            return Err(RepoError::Integrity {
                message: "comment references a missing post".to_string(),
            });
        }
        let author = state
            .user_summary(params.author_id)
            .ok_or(RepoError::NotFound)?;
        let id = state.next_id();
        let created = EPOCH + Duration::seconds(id);
        state.comments.push(StoredComment {
            id,
            post_id: params.post_id,
            author_id: params.author_id,
            text: params.text.clone(),
            created,
        });
        Ok(CommentRecord {
            id,
            post_id: params.post_id,
            author,
            text: params.text,
            created,
        })
    }
}

#[async_trait]
impl FollowsRepo for InMemoryRepos {
    async fn create_follow(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let mut state = self.state();
        if state.follows.contains(&edge) {
            return Ok(false);
        }
        state.follows.push(edge);
        Ok(true)
    }

    async fn delete_follow(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let mut state = self.state();
        let before = state.follows.len();
        state.follows.retain(|existing| *existing != edge);
        Ok(state.follows.len() < before)
    }

    async fn is_following(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        Ok(self.state().follows.contains(&edge))
    }

    async fn followed_author_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        let mut ids: Vec<i64> = self
            .state()
            .follows
            .iter()
            .filter(|edge| edge.user_id() == user_id)
            .map(FollowEdge::author_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn count_followers(&self, author_id: i64) -> Result<u64, RepoError> {
        Ok(self
            .state()
            .follows
            .iter()
            .filter(|edge| edge.author_id() == author_id)
            .count() as u64)
    }

    async fn count_following(&self, user_id: i64) -> Result<u64, RepoError> {
        Ok(self
            .state()
            .follows
            .iter()
            .filter(|edge| edge.user_id() == user_id)
            .count() as u64)
    }
}

#[async_trait]
impl SessionsRepo for InMemoryRepos {
    async fn create_session(&self, params: CreateSessionParams) -> Result<(), RepoError> {
        self.state().sessions.push(StoredSession {
            token_hash: params.token_hash,
            user_id: params.user_id,
            expires_at: params.expires_at,
        });
        Ok(())
    }

    async fn find_session_user(
        &self,
        token_hash: &[u8],
        now: OffsetDateTime,
    ) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state();
        let Some(session) = state
            .sessions
            .iter()
            .find(|session| session.token_hash == token_hash && session.expires_at > now)
        else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|user| user.record.id == session.user_id)
            .map(|user| user.record.clone()))
    }

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError> {
        self.state()
            .sessions
            .retain(|session| session.token_hash != token_hash);
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for InMemoryRepos {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// The public and admin routers wired to in-memory storage.
pub struct TestApp {
    pub repos: Arc<InMemoryRepos>,
    pub state: HttpState,
    pub router: Router,
    pub admin: Router,
    pub media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn without_cache() -> Self {
        Self::build(false)
    }

    fn build(cache_enabled: bool) -> Self {
        let repos = Arc::new(InMemoryRepos::default());
        let media = tempfile::tempdir().expect("media dir");
        let uploads =
            Arc::new(UploadStorage::new(media.path().to_path_buf()).expect("upload storage"));

        let cache = cache_enabled.then(|| CacheState::new(CacheConfig::default(), SESSION_COOKIE));
        let session_cookie = SessionCookie {
            name: SESSION_COOKIE.to_string(),
            secure: false,
            max_age: Duration::days(14),
        };

        let state = HttpState::new(
            repos.clone(),
            uploads,
            cache.clone(),
            session_cookie,
            10 * 1024 * 1024,
        );
        let router = build_router(state.clone());
        let admin = build_admin_router(AdminState {
            db: repos.clone(),
            cache,
        });

        Self {
            repos,
            state,
            router,
            admin,
            media,
        }
    }

    /// Start a session for `user` and return the `Cookie` header value.
    pub async fn login(&self, user: &UserRecord) -> String {
        let session = self
            .state
            .auth
            .start_session(user)
            .await
            .expect("session started");
        format!("{SESSION_COOKIE}={}", session.token)
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).expect("request"))
            .await
    }

    pub async fn post_form(&self, path: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).expect("request"))
            .await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        form: &MultipartBody,
        cookie: Option<&str>,
    ) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, form.content_type());
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(form.bytes())).expect("request"))
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn admin_post(&self, path: &str) -> Response {
        self.admin_send("POST", path).await
    }

    pub async fn admin_get(&self, path: &str) -> Response {
        self.admin_send("GET", path).await
    }

    async fn admin_send(&self, method: &str, path: &str) -> Response {
        self.admin
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router is infallible")
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    parts: Vec<u8>,
}

impl MultipartBody {
    const BOUNDARY: &'static str = "yatube-test-boundary";

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                Self::BOUNDARY
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                Self::BOUNDARY
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(data);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", Self::BOUNDARY)
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut body = self.parts.clone();
        body.extend_from_slice(format!("--{}--\r\n", Self::BOUNDARY).as_bytes());
        body
    }
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Number of post cards rendered on a feed page.
pub fn card_count(html: &str) -> usize {
    html.matches("class=\"post-card\"").count()
}
