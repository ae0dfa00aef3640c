//! Forum payloads.

use serde::Serialize;

use crate::domain::forum::{Category, Post, Thread};
use crate::domain::user::UserSummary;
use crate::pagination::Paginated;

#[derive(Debug, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub thread_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ThreadListItem {
    #[serde(flatten)]
    pub thread: Thread,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct ThreadListPage {
    pub category: Category,
    pub threads: Paginated<ThreadListItem>,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub category: Category,
    pub posts: Paginated<PostView>,
}

#[derive(Debug, Serialize)]
pub struct CreatedThread {
    pub thread: Thread,
    pub post: Post,
}
