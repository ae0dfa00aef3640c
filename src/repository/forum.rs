//! Repository implementation for the discussion forum.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::dsl::{count_star, min};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::forum::{
    Category, EVENTS_CATEGORY_NAME, EVENTS_CATEGORY_SLUG, EventThreadContent, NewCategory,
    NewPost, NewThread, Post, Thread, ThreadModeration, cancelled_title,
};
use crate::domain::types::{CategoryId, EventId, PostBody, PostId, Slug, ThreadId, ThreadTitle};
use crate::models::forum::{
    Category as DbCategory, ModerateThread as DbModerateThread, NewCategory as DbNewCategory,
    NewPost as DbNewPost, NewThread as DbNewThread, Post as DbPost, Thread as DbThread,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ForumReader, ForumWriter, Pagination, ThreadListQuery};

const EVENTS_CATEGORY_DESCRIPTION: &str = "Discussion threads for community events";

fn thread_into_domain(thread: DbThread) -> RepositoryResult<Thread> {
    Thread::try_from(thread).map_err(RepositoryError::from)
}

fn post_into_domain(post: DbPost) -> RepositoryResult<Post> {
    Post::try_from(post).map_err(RepositoryError::from)
}

/// Unlinks, locks and marks as cancelled the thread of an event.
///
/// Runs on the caller's connection so event deletion can close the thread
/// inside its own transaction.
pub(crate) fn close_event_thread(
    conn: &mut SqliteConnection,
    event_id: EventId,
) -> RepositoryResult<Option<Thread>> {
    use crate::schema::forum_threads;

    let Some(thread) = forum_threads::table
        .filter(forum_threads::event_id.eq(event_id.get()))
        .first::<DbThread>(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let title = cancelled_title(&thread.title)
        .chars()
        .take(ThreadTitle::MAX_LEN)
        .collect::<String>();

    let thread = diesel::update(forum_threads::table.find(thread.id))
        .set((
            forum_threads::event_id.eq(None::<i32>),
            forum_threads::is_locked.eq(true),
            forum_threads::title.eq(title),
        ))
        .get_result::<DbThread>(conn)?;

    thread_into_domain(thread).map(Some)
}

/// Returns the events category, creating it on first use.
fn ensure_events_category(
    conn: &mut SqliteConnection,
    created_at: NaiveDateTime,
) -> RepositoryResult<DbCategory> {
    use crate::schema::forum_categories;

    diesel::insert_into(forum_categories::table)
        .values(&DbNewCategory {
            name: EVENTS_CATEGORY_NAME,
            slug: EVENTS_CATEGORY_SLUG,
            description: EVENTS_CATEGORY_DESCRIPTION,
            position: 0,
            created_at,
        })
        .on_conflict_do_nothing()
        .execute(conn)?;

    let category = forum_categories::table
        .filter(forum_categories::slug.eq(EVENTS_CATEGORY_SLUG))
        .first::<DbCategory>(conn)?;

    Ok(category)
}

impl ForumReader for DieselRepository {
    fn list_categories(&self) -> RepositoryResult<Vec<(Category, usize)>> {
        use crate::schema::{forum_categories, forum_threads};

        let mut conn = self.conn()?;

        let categories = forum_categories::table
            .order((forum_categories::position.asc(), forum_categories::name.asc()))
            .load::<DbCategory>(&mut conn)?;

        let counts = forum_threads::table
            .group_by(forum_threads::category_id)
            .select((forum_threads::category_id, count_star()))
            .load::<(i32, i64)>(&mut conn)?
            .into_iter()
            .collect::<HashMap<i32, i64>>();

        categories
            .into_iter()
            .map(|category| -> RepositoryResult<(Category, usize)> {
                let count = counts.get(&category.id).copied().unwrap_or(0) as usize;
                let category = Category::try_from(category)?;
                Ok((category, count))
            })
            .collect()
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        use crate::schema::forum_categories;

        let mut conn = self.conn()?;
        let category = forum_categories::table
            .find(id.get())
            .first::<DbCategory>(&mut conn)
            .optional()?;

        category
            .map(|category| Category::try_from(category).map_err(RepositoryError::from))
            .transpose()
    }

    fn get_category_by_slug(&self, slug: &Slug) -> RepositoryResult<Option<Category>> {
        use crate::schema::forum_categories;

        let mut conn = self.conn()?;
        let category = forum_categories::table
            .filter(forum_categories::slug.eq(slug.as_str()))
            .first::<DbCategory>(&mut conn)
            .optional()?;

        category
            .map(|category| Category::try_from(category).map_err(RepositoryError::from))
            .transpose()
    }

    fn list_threads(&self, query: ThreadListQuery) -> RepositoryResult<(usize, Vec<Thread>)> {
        use crate::schema::forum_threads;

        let mut conn = self.conn()?;
        let category_id = query.category_id.get();

        let query_builder = || {
            forum_threads::table
                .filter(forum_threads::category_id.eq(category_id))
                .into_boxed::<Sqlite>()
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order((
            forum_threads::is_pinned.desc(),
            forum_threads::last_activity_at.desc(),
            forum_threads::id.desc(),
        ));
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let threads = items
            .load::<DbThread>(&mut conn)?
            .into_iter()
            .map(thread_into_domain)
            .collect::<RepositoryResult<Vec<Thread>>>()?;

        Ok((total, threads))
    }

    fn get_thread(&self, id: ThreadId) -> RepositoryResult<Option<Thread>> {
        use crate::schema::forum_threads;

        let mut conn = self.conn()?;
        forum_threads::table
            .find(id.get())
            .first::<DbThread>(&mut conn)
            .optional()?
            .map(thread_into_domain)
            .transpose()
    }

    fn get_thread_by_event(&self, event_id: EventId) -> RepositoryResult<Option<Thread>> {
        use crate::schema::forum_threads;

        let mut conn = self.conn()?;
        forum_threads::table
            .filter(forum_threads::event_id.eq(event_id.get()))
            .first::<DbThread>(&mut conn)
            .optional()?
            .map(thread_into_domain)
            .transpose()
    }

    fn list_posts(
        &self,
        thread_id: ThreadId,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<Post>)> {
        use crate::schema::forum_posts;

        let mut conn = self.conn()?;
        let thread_id = thread_id.get();

        let query_builder = || {
            forum_posts::table
                .filter(forum_posts::thread_id.eq(thread_id))
                .into_boxed::<Sqlite>()
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items =
            query_builder().order((forum_posts::created_at.asc(), forum_posts::id.asc()));
        if let Some(pagination) = &pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let posts = items
            .load::<DbPost>(&mut conn)?
            .into_iter()
            .map(post_into_domain)
            .collect::<RepositoryResult<Vec<Post>>>()?;

        Ok((total, posts))
    }

    fn get_post(&self, id: PostId) -> RepositoryResult<Option<Post>> {
        use crate::schema::forum_posts;

        let mut conn = self.conn()?;
        forum_posts::table
            .find(id.get())
            .first::<DbPost>(&mut conn)
            .optional()?
            .map(post_into_domain)
            .transpose()
    }

    fn first_post_id(&self, thread_id: ThreadId) -> RepositoryResult<Option<PostId>> {
        use crate::schema::forum_posts;

        let mut conn = self.conn()?;
        let first = forum_posts::table
            .filter(forum_posts::thread_id.eq(thread_id.get()))
            .select(min(forum_posts::id))
            .first::<Option<i32>>(&mut conn)?;

        Ok(first.map(PostId::new).transpose()?)
    }
}

impl ForumWriter for DieselRepository {
    fn create_category(&self, new_category: &NewCategory) -> RepositoryResult<Category> {
        use crate::schema::forum_categories;

        let mut conn = self.conn()?;
        let insertable: DbNewCategory = new_category.into();

        let category = diesel::insert_into(forum_categories::table)
            .values(&insertable)
            .get_result::<DbCategory>(&mut conn)?;

        Category::try_from(category).map_err(RepositoryError::from)
    }

    fn create_thread(&self, new_thread: &NewThread) -> RepositoryResult<(Thread, Post)> {
        use crate::schema::{forum_posts, forum_threads};

        let mut conn = self.conn()?;

        let (thread, post) = conn.transaction::<_, RepositoryError, _>(|conn| {
            let thread = diesel::insert_into(forum_threads::table)
                .values(&DbNewThread {
                    category_id: new_thread.category_id.get(),
                    author_id: new_thread.author_id.get(),
                    event_id: None,
                    title: new_thread.title.as_str(),
                    post_count: 1,
                    created_at: new_thread.created_at,
                    last_activity_at: new_thread.created_at,
                })
                .get_result::<DbThread>(conn)?;

            let post = diesel::insert_into(forum_posts::table)
                .values(&DbNewPost {
                    thread_id: thread.id,
                    author_id: new_thread.author_id.get(),
                    body: new_thread.body.as_str(),
                    created_at: new_thread.created_at,
                    updated_at: new_thread.created_at,
                })
                .get_result::<DbPost>(conn)?;

            Ok((thread, post))
        })?;

        Ok((thread_into_domain(thread)?, post_into_domain(post)?))
    }

    fn delete_thread(&self, id: ThreadId) -> RepositoryResult<()> {
        use crate::schema::{forum_posts, forum_threads};

        let mut conn = self.conn()?;

        conn.transaction::<(), RepositoryError, _>(|conn| {
            diesel::delete(forum_posts::table.filter(forum_posts::thread_id.eq(id.get())))
                .execute(conn)?;
            let deleted = diesel::delete(forum_threads::table.find(id.get())).execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }

    fn moderate_thread(
        &self,
        id: ThreadId,
        moderation: ThreadModeration,
    ) -> RepositoryResult<Thread> {
        use crate::schema::forum_threads;

        let mut conn = self.conn()?;

        let thread = if moderation == ThreadModeration::default() {
            forum_threads::table
                .find(id.get())
                .first::<DbThread>(&mut conn)?
        } else {
            diesel::update(forum_threads::table.find(id.get()))
                .set(&DbModerateThread::from(moderation))
                .get_result::<DbThread>(&mut conn)?
        };

        thread_into_domain(thread)
    }

    fn create_post(&self, new_post: &NewPost) -> RepositoryResult<Post> {
        use crate::schema::{forum_posts, forum_threads};

        let mut conn = self.conn()?;
        let insertable: DbNewPost = new_post.into();

        let post = conn.transaction::<DbPost, RepositoryError, _>(|conn| {
            let post = diesel::insert_into(forum_posts::table)
                .values(&insertable)
                .get_result::<DbPost>(conn)?;

            diesel::update(forum_threads::table.find(new_post.thread_id.get()))
                .set((
                    forum_threads::post_count.eq(forum_threads::post_count + 1),
                    forum_threads::last_activity_at.eq(new_post.created_at),
                ))
                .execute(conn)?;

            Ok(post)
        })?;

        post_into_domain(post)
    }

    fn update_post(
        &self,
        id: PostId,
        body: &PostBody,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Post> {
        use crate::schema::forum_posts;

        let mut conn = self.conn()?;
        let post = diesel::update(forum_posts::table.find(id.get()))
            .set((
                forum_posts::body.eq(body.as_str()),
                forum_posts::updated_at.eq(updated_at),
            ))
            .get_result::<DbPost>(&mut conn)?;

        post_into_domain(post)
    }

    fn delete_post(&self, id: PostId) -> RepositoryResult<()> {
        use crate::schema::{forum_posts, forum_threads};

        let mut conn = self.conn()?;

        conn.transaction::<(), RepositoryError, _>(|conn| {
            let thread_id = forum_posts::table
                .find(id.get())
                .select(forum_posts::thread_id)
                .first::<i32>(conn)?;

            diesel::delete(forum_posts::table.find(id.get())).execute(conn)?;

            diesel::update(forum_threads::table.find(thread_id))
                .set(forum_threads::post_count.eq(forum_threads::post_count - 1))
                .execute(conn)?;

            Ok(())
        })
    }

    fn sync_event_thread(&self, content: &EventThreadContent) -> RepositoryResult<Thread> {
        use crate::schema::{forum_posts, forum_threads};

        let mut conn = self.conn()?;

        let thread = conn.transaction::<DbThread, RepositoryError, _>(|conn| {
            let category = ensure_events_category(conn, content.updated_at)?;

            let existing = forum_threads::table
                .filter(forum_threads::event_id.eq(content.event_id.get()))
                .first::<DbThread>(conn)
                .optional()?;

            match existing {
                Some(thread) => {
                    let thread = diesel::update(forum_threads::table.find(thread.id))
                        .set((
                            forum_threads::title.eq(content.title.as_str()),
                            forum_threads::last_activity_at.eq(content.updated_at),
                        ))
                        .get_result::<DbThread>(conn)?;

                    let first_post = forum_posts::table
                        .filter(forum_posts::thread_id.eq(thread.id))
                        .select(min(forum_posts::id))
                        .first::<Option<i32>>(conn)?;

                    match first_post {
                        Some(post_id) => {
                            diesel::update(forum_posts::table.find(post_id))
                                .set((
                                    forum_posts::body.eq(content.body.as_str()),
                                    forum_posts::updated_at.eq(content.updated_at),
                                ))
                                .execute(conn)?;
                        }
                        None => {
                            diesel::insert_into(forum_posts::table)
                                .values(&DbNewPost {
                                    thread_id: thread.id,
                                    author_id: content.author_id.get(),
                                    body: content.body.as_str(),
                                    created_at: content.updated_at,
                                    updated_at: content.updated_at,
                                })
                                .execute(conn)?;
                            diesel::update(forum_threads::table.find(thread.id))
                                .set(forum_threads::post_count.eq(forum_threads::post_count + 1))
                                .execute(conn)?;
                        }
                    }

                    Ok(thread)
                }
                None => {
                    let thread = diesel::insert_into(forum_threads::table)
                        .values(&DbNewThread {
                            category_id: category.id,
                            author_id: content.author_id.get(),
                            event_id: Some(content.event_id.get()),
                            title: content.title.as_str(),
                            post_count: 1,
                            created_at: content.updated_at,
                            last_activity_at: content.updated_at,
                        })
                        .get_result::<DbThread>(conn)?;

                    diesel::insert_into(forum_posts::table)
                        .values(&DbNewPost {
                            thread_id: thread.id,
                            author_id: content.author_id.get(),
                            body: content.body.as_str(),
                            created_at: content.updated_at,
                            updated_at: content.updated_at,
                        })
                        .execute(conn)?;

                    Ok(thread)
                }
            }
        })?;

        thread_into_domain(thread)
    }
}
