//! Canonical public URL paths.
//!
//! Every path ends in `/`, matching the routes registered by the public router.

use url::form_urlencoded;

pub const INDEX: &str = "/";
pub const NEW_POST: &str = "/new/";
pub const FOLLOW_FEED: &str = "/follow/";
pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const SIGNUP: &str = "/auth/signup/";
pub const ABOUT_AUTHOR: &str = "/about/author/";
pub const ABOUT_TECH: &str = "/about/tech/";

pub fn group(slug: &str) -> String {
    format!("/group/{slug}/")
}

pub fn profile(username: &str) -> String {
    format!("/{username}/")
}

pub fn follow(username: &str) -> String {
    format!("/{username}/follow/")
}

pub fn unfollow(username: &str) -> String {
    format!("/{username}/unfollow/")
}

pub fn media(path: &str) -> String {
    format!("/media/{path}")
}

/// The routes nested under a single post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRoute {
    View,
    Edit,
    Comment,
}

impl PostRoute {
    pub fn path(self, username: &str, post_id: i64) -> String {
        match self {
            PostRoute::View => format!("/{username}/{post_id}/"),
            PostRoute::Edit => format!("/{username}/{post_id}/edit/"),
            PostRoute::Comment => format!("/{username}/{post_id}/comment/"),
        }
    }
}

/// Login URL that sends the user back to `next` afterwards.
///
/// Slashes stay readable in the query value, so `/new/` yields
/// `/auth/login/?next=/new/`.
pub fn login_with_next(next: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{LOGIN}?next={}", encoded.replace("%2F", "/"))
}

/// Accept only same-site absolute paths as post-login redirect targets.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|candidate| {
        candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.contains('\\')
    })
}
