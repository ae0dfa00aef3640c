//! Discussion forum: categories, threads and posts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CategoryId, CategoryName, EventId, PostBody, PostId, Slug, ThreadId, ThreadTitle, UserId,
};

/// Slug of the category that hosts event discussion threads.
pub const EVENTS_CATEGORY_SLUG: &str = "events";
/// Display name of the events category.
pub const EVENTS_CATEGORY_NAME: &str = "Events";
/// Prefix applied to threads whose event was deleted.
pub const CANCELLED_PREFIX: &str = "[Cancelled] ";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub slug: Slug,
    pub description: String,
    pub position: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: CategoryName,
    pub slug: Slug,
    pub description: String,
    pub position: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: ThreadId,
    pub category_id: CategoryId,
    pub author_id: UserId,
    pub event_id: Option<EventId>,
    pub title: ThreadTitle,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub post_count: i32,
    pub created_at: NaiveDateTime,
    pub last_activity_at: NaiveDateTime,
}

/// A thread together with the body of its opening post.
#[derive(Clone, Debug)]
pub struct NewThread {
    pub category_id: CategoryId,
    pub author_id: UserId,
    pub title: ThreadTitle,
    pub body: PostBody,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub body: PostBody,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewPost {
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub body: PostBody,
    pub created_at: NaiveDateTime,
}

/// Moderation flags; `None` keeps the current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadModeration {
    pub is_pinned: Option<bool>,
    pub is_locked: Option<bool>,
}

/// Content mirrored from an event into its discussion thread.
#[derive(Clone, Debug, PartialEq)]
pub struct EventThreadContent {
    pub event_id: EventId,
    pub author_id: UserId,
    pub title: ThreadTitle,
    pub body: PostBody,
    pub updated_at: NaiveDateTime,
}

/// Title for a thread whose event has been cancelled; applying it twice is a no-op.
pub fn cancelled_title(title: &str) -> String {
    if title.starts_with(CANCELLED_PREFIX) {
        title.to_string()
    } else {
        format!("{CANCELLED_PREFIX}{title}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_title_is_not_duplicated() {
        let once = cancelled_title("Sunday cruise");
        assert_eq!(once, "[Cancelled] Sunday cruise");
        assert_eq!(cancelled_title(&once), once);
    }
}
