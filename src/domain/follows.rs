//! Subscription edges between users.

/// A directed `user -> author` subscription that is allowed to exist.
///
/// Self-subscriptions cannot be constructed: callers asking to follow
/// themselves get `None` and nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    user_id: i64,
    author_id: i64,
}

impl FollowEdge {
    pub fn new(user_id: i64, author_id: i64) -> Option<Self> {
        (user_id != author_id).then_some(Self { user_id, author_id })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn author_id(&self) -> i64 {
        self.author_id
    }
}
