//! Public site router: feeds, profiles, posts, accounts and media.

mod accounts;
mod feeds;
mod pages;
mod posts;
mod profiles;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Uri,
    middleware,
    response::Response,
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::{
    application::{
        auth::AuthService,
        feed::FeedService,
        follows::FollowService,
        posts::PostService,
        repos::{
            CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, Repositories, SessionsRepo,
            UsersRepo,
        },
        routes,
    },
    cache::{CacheState, response_cache_layer},
    config::SessionSettings,
    infra::uploads::UploadStorage,
};

use super::{
    found,
    middleware::{load_viewer, log_responses, render_error_pages, set_request_context},
};

const DEFAULT_SESSION_TTL: time::Duration = time::Duration::weeks(2);

/// Attributes of the session cookie.
#[derive(Clone, Debug)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age: time::Duration,
}

impl SessionCookie {
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            name: settings.cookie_name.clone(),
            secure: settings.secure_cookie,
            max_age: time::Duration::try_from(settings.ttl).unwrap_or(DEFAULT_SESSION_TTL),
        }
    }

    pub(crate) fn issue(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.max_age)
            .build()
    }

    pub(crate) fn removal(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), "")).path("/").build()
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub auth: Arc<AuthService>,
    pub uploads: Arc<UploadStorage>,
    pub cache: Option<CacheState>,
    pub session_cookie: SessionCookie,
    pub upload_body_limit: usize,
}

impl HttpState {
    /// Wire every service onto one repository backend.
    pub fn new<R: Repositories>(
        repositories: Arc<R>,
        uploads: Arc<UploadStorage>,
        cache: Option<CacheState>,
        session_cookie: SessionCookie,
        upload_body_limit: usize,
    ) -> Self {
        let users: Arc<dyn UsersRepo> = repositories.clone();
        let groups: Arc<dyn GroupsRepo> = repositories.clone();
        let posts: Arc<dyn PostsRepo> = repositories.clone();
        let comments: Arc<dyn CommentsRepo> = repositories.clone();
        let follows: Arc<dyn FollowsRepo> = repositories.clone();
        let sessions: Arc<dyn SessionsRepo> = repositories;

        Self {
            feed: Arc::new(FeedService::new(
                posts.clone(),
                groups.clone(),
                users.clone(),
                follows.clone(),
            )),
            posts: Arc::new(PostService::new(
                posts,
                comments,
                groups,
                users.clone(),
                uploads.clone(),
            )),
            follows: Arc::new(FollowService::new(users.clone(), follows)),
            auth: Arc::new(AuthService::new(users, sessions, session_cookie.max_age)),
            uploads,
            cache,
            session_cookie,
            upload_body_limit,
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    let mut feed_routes = Router::new()
        .route(routes::INDEX, get(feeds::index))
        .route("/group/{slug}/", get(feeds::group_posts))
        .route(routes::FOLLOW_FEED, get(feeds::follow_index));

    if let Some(cache) = state.cache.clone() {
        feed_routes = feed_routes.layer(middleware::from_fn_with_state(
            cache,
            response_cache_layer,
        ));
    }

    let page_routes = Router::new()
        .route(
            routes::NEW_POST,
            get(posts::new_post_form).post(posts::create_post),
        )
        .route(
            routes::SIGNUP,
            get(accounts::signup_form).post(accounts::signup),
        )
        .route(routes::LOGIN, get(accounts::login_form).post(accounts::login))
        .route(
            routes::LOGOUT,
            get(accounts::logout).post(accounts::logout),
        )
        .route(routes::ABOUT_AUTHOR, get(pages::about_author))
        .route(routes::ABOUT_TECH, get(pages::about_tech))
        .route("/404/", get(pages::not_found_page))
        .route("/500/", get(pages::server_error_page))
        .route("/media/{*path}", get(pages::serve_media))
        .route("/{username}/", get(profiles::profile))
        .route("/{username}/follow/", get(profiles::profile_follow))
        .route("/{username}/unfollow/", get(profiles::profile_unfollow))
        .route("/{username}/{post_id}/", get(posts::post_view))
        .route(
            "/{username}/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route(
            "/{username}/{post_id}/comment/",
            get(posts::comment_redirect).post(posts::add_comment),
        )
        .layer(DefaultBodyLimit::max(state.upload_body_limit));

    feed_routes
        .merge(page_routes)
        .fallback(pages::fallback)
        .with_state(state.clone())
        .layer(middleware::from_fn(render_error_pages))
        .layer(middleware::from_fn_with_state(state, load_viewer))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// Send a guest to the login page, returning to `uri` afterwards.
fn login_redirect(uri: &Uri) -> Response {
    let next = uri
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or_else(|| uri.path());
    found(&routes::login_with_next(next))
}
