//! Authorship guards for post-scoped routes.
//!
//! Routes under `/{username}/{post_id}/` run these checks in a fixed order:
//! the username must name the post's author, then (on mutating routes) the
//! request must be authenticated, then (on edit) the viewer must be the author.

use crate::application::routes::PostRoute;
use crate::domain::entities::{PostRecord, UserRecord};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(String),
}

/// The username segment must belong to the post's author.
///
/// On a mismatch the caller is sent to the same route under the author's real
/// username.
pub fn check_author_username(url_username: &str, post: &PostRecord, route: PostRoute) -> Access {
    if post.author.username == url_username {
        Access::Granted
    } else {
        Access::Redirect(route.path(&post.author.username, post.id))
    }
}

/// Only the author may proceed; anyone else is sent to the read-only view.
pub fn author_access(viewer: &UserRecord, post: &PostRecord) -> Access {
    if post.is_authored_by(viewer.id) {
        Access::Granted
    } else {
        Access::Redirect(PostRoute::View.path(&post.author.username, post.id))
    }
}
