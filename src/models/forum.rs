//! Diesel models for forum categories, threads and posts.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::forum::{
    Category as DomainCategory, NewCategory as DomainNewCategory, NewPost as DomainNewPost,
    Post as DomainPost, Thread as DomainThread, ThreadModeration,
};
use crate::domain::types::{
    CategoryId, CategoryName, EventId, PostBody, PostId, Slug, ThreadId, ThreadTitle,
    TypeConstraintError, UserId,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::forum_categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub position: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::forum_categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
    pub position: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Category, foreign_key = category_id))]
#[diesel(table_name = crate::schema::forum_threads)]
pub struct Thread {
    pub id: i32,
    pub category_id: i32,
    pub author_id: i32,
    pub event_id: Option<i32>,
    pub title: String,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub post_count: i32,
    pub created_at: NaiveDateTime,
    pub last_activity_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::forum_threads)]
pub struct NewThread<'a> {
    pub category_id: i32,
    pub author_id: i32,
    pub event_id: Option<i32>,
    pub title: &'a str,
    pub post_count: i32,
    pub created_at: NaiveDateTime,
    pub last_activity_at: NaiveDateTime,
}

/// Moderation flags; `None` fields are left untouched.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::forum_threads)]
pub struct ModerateThread {
    pub is_pinned: Option<bool>,
    pub is_locked: Option<bool>,
}

impl From<ThreadModeration> for ModerateThread {
    fn from(moderation: ThreadModeration) -> Self {
        Self {
            is_pinned: moderation.is_pinned,
            is_locked: moderation.is_locked,
        }
    }
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(belongs_to(Thread, foreign_key = thread_id))]
#[diesel(table_name = crate::schema::forum_posts)]
pub struct Post {
    pub id: i32,
    pub thread_id: i32,
    pub author_id: i32,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::forum_posts)]
pub struct NewPost<'a> {
    pub thread_id: i32,
    pub author_id: i32,
    pub body: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Category> for DomainCategory {
    type Error = TypeConstraintError;

    fn try_from(category: Category) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(category.id)?,
            name: CategoryName::new(category.name)?,
            slug: Slug::parse(&category.slug)?,
            description: category.description,
            position: category.position,
            created_at: category.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewCategory> for NewCategory<'a> {
    fn from(category: &'a DomainNewCategory) -> Self {
        Self {
            name: category.name.as_str(),
            slug: category.slug.as_str(),
            description: category.description.as_str(),
            position: category.position,
            created_at: category.created_at,
        }
    }
}

impl TryFrom<Thread> for DomainThread {
    type Error = TypeConstraintError;

    fn try_from(thread: Thread) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ThreadId::new(thread.id)?,
            category_id: CategoryId::new(thread.category_id)?,
            author_id: UserId::new(thread.author_id)?,
            event_id: thread.event_id.map(EventId::new).transpose()?,
            title: ThreadTitle::new(thread.title)?,
            is_pinned: thread.is_pinned,
            is_locked: thread.is_locked,
            post_count: thread.post_count,
            created_at: thread.created_at,
            last_activity_at: thread.last_activity_at,
        })
    }
}

impl TryFrom<Post> for DomainPost {
    type Error = TypeConstraintError;

    fn try_from(post: Post) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PostId::new(post.id)?,
            thread_id: ThreadId::new(post.thread_id)?,
            author_id: UserId::new(post.author_id)?,
            body: PostBody::from_trusted(post.body),
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewPost> for NewPost<'a> {
    fn from(post: &'a DomainNewPost) -> Self {
        Self {
            thread_id: post.thread_id.get(),
            author_id: post.author_id.get(),
            body: post.body.as_str(),
            created_at: post.created_at,
            updated_at: post.created_at,
        }
    }
}
