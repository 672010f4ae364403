//! Domain entities mirrored from persistent storage.

use std::fmt;

use time::OffsetDateTime;

use super::text::{WRAP_WIDTH, format_date, wrap_text};

pub const USERNAME_MAX_LEN: usize = 150;
pub const GROUP_TITLE_MAX_LEN: usize = 200;
pub const GROUP_SLUG_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: OffsetDateTime,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name(),
        }
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// The slice of a user embedded in posts, comments and follow edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl UserSummary {
    pub fn new(id: i64, username: String, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            username,
            full_name: join_name(first_name, last_name),
        }
    }

    /// Full name when one is set, the username otherwise.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

impl fmt::Display for UserSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl GroupRecord {
    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
        }
    }
}

impl fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub text: String,
    pub pub_date: OffsetDateTime,
    pub author: UserSummary,
    pub group: Option<GroupSummary>,
    /// Storage path relative to the media root, e.g. `posts/sunset-1f2e3d4c.gif`.
    pub image: Option<String>,
}

impl PostRecord {
    pub fn is_authored_by(&self, user_id: i64) -> bool {
        self.author.id == user_id
    }
}

impl fmt::Display for PostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = self
            .group
            .as_ref()
            .map(|group| group.title.as_str())
            .unwrap_or("None");
        write!(
            f,
            "Author: {}\nGroup: {}\nPublished: {}\nText:\n{}\n\n",
            self.author,
            group,
            format_date(self.pub_date),
            wrap_text(&self.text, WRAP_WIDTH),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub author: UserSummary,
    pub text: String,
    pub created: OffsetDateTime,
}

impl fmt::Display for CommentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Author: {}\nDate: {}\nText:\n{}\n\n",
            self.author,
            format_date(self.created),
            wrap_text(&self.text, WRAP_WIDTH),
        )
    }
}

/// A persisted subscription of `user` to `author`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRecord {
    pub user: UserSummary,
    pub author: UserSummary,
}

impl fmt::Display for FollowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Author: {}\nFollower: {}\n", self.author, self.user)
    }
}

fn join_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}
