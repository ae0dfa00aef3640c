//! Forum categories, threads and posts.

use std::collections::HashMap;

use chrono::Utc;

use crate::domain::forum::{Category, NewCategory, NewPost, NewThread, Post, Thread};
use crate::domain::types::{PostBody, PostId, Slug, ThreadId, UserId};
use crate::domain::user::UserSummary;
use crate::dto::PageQuery;
use crate::dto::forum::{
    CategoryView, CreatedThread, PostView, ThreadDetail, ThreadListItem, ThreadListPage,
};
use crate::forms::forum::{CategoryForm, CategoryPayload, ModerateThreadForm, PostForm, ThreadForm, ThreadPayload};
use crate::models::auth::{ADMIN_ROLE, AuthenticatedUser};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{ForumReader, ForumWriter, Pagination, ThreadListQuery, UserReader};
use crate::services::{ServiceError, ServiceResult, current_user_id, ensure_role};

fn authors<R>(repo: &R, ids: Vec<UserId>) -> ServiceResult<HashMap<UserId, UserSummary>>
where
    R: UserReader + ?Sized,
{
    let mut ids = ids;
    ids.sort_unstable();
    ids.dedup();
    Ok(repo
        .get_users_by_ids(&ids)?
        .iter()
        .map(|user| (user.id, UserSummary::from(user)))
        .collect())
}

fn category_by_slug<R>(repo: &R, slug: &str) -> ServiceResult<Category>
where
    R: ForumReader + ?Sized,
{
    let slug = Slug::parse(slug).map_err(|_| ServiceError::NotFound)?;
    repo.get_category_by_slug(&slug)?
        .ok_or(ServiceError::NotFound)
}

fn load_thread<R>(repo: &R, id: i32) -> ServiceResult<Thread>
where
    R: ForumReader + ?Sized,
{
    let id = ThreadId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_thread(id)?.ok_or(ServiceError::NotFound)
}

fn load_post<R>(repo: &R, id: i32) -> ServiceResult<Post>
where
    R: ForumReader + ?Sized,
{
    let id = PostId::new(id).map_err(|_| ServiceError::NotFound)?;
    repo.get_post(id)?.ok_or(ServiceError::NotFound)
}

pub fn list_categories<R>(repo: &R) -> ServiceResult<Vec<CategoryView>>
where
    R: ForumReader + ?Sized,
{
    Ok(repo
        .list_categories()?
        .into_iter()
        .map(|(category, thread_count)| CategoryView {
            category,
            thread_count,
        })
        .collect())
}

/// Admin only. The slug is derived from the name.
pub fn create_category<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CategoryForm,
) -> ServiceResult<Category>
where
    R: ForumWriter + ?Sized,
{
    ensure_role(user, ADMIN_ROLE)?;
    let payload = CategoryPayload::try_from(form)?;

    let category = repo
        .create_category(&NewCategory {
            name: payload.name,
            slug: payload.slug,
            description: payload.description,
            position: payload.position,
            created_at: Utc::now().naive_utc(),
        })
        .map_err(|err| {
            log::error!("Failed to create category: {err}");
            err
        })?;
    log::info!("Created forum category {}", category.slug);

    Ok(category)
}

/// Threads of a category, pinned first, then by latest activity.
pub fn list_threads<R>(repo: &R, slug: &str, query: PageQuery) -> ServiceResult<ThreadListPage>
where
    R: ForumReader + UserReader + ?Sized,
{
    let category = category_by_slug(repo, slug)?;
    let page = query.page.unwrap_or(1).max(1);

    let (total, threads) = repo
        .list_threads(ThreadListQuery::new(category.id).paginate(page, DEFAULT_ITEMS_PER_PAGE))?;
    let authors = authors(repo, threads.iter().map(|t| t.author_id).collect())?;

    let items = threads
        .into_iter()
        .map(|thread| ThreadListItem {
            author: authors.get(&thread.author_id).cloned(),
            thread,
        })
        .collect();

    Ok(ThreadListPage {
        category,
        threads: Paginated::new(items, page, total),
    })
}

/// Opens a thread with its first post.
pub fn create_thread<R>(
    repo: &R,
    user: &AuthenticatedUser,
    slug: &str,
    form: ThreadForm,
) -> ServiceResult<CreatedThread>
where
    R: ForumReader + ForumWriter + ?Sized,
{
    let author_id = current_user_id(user)?;
    let category = category_by_slug(repo, slug)?;
    let payload = ThreadPayload::try_from(form)?;

    let (thread, post) = repo
        .create_thread(&NewThread {
            category_id: category.id,
            author_id,
            title: payload.title,
            body: payload.body,
            created_at: Utc::now().naive_utc(),
        })
        .map_err(|err| {
            log::error!("Failed to create thread in {}: {err}", category.slug);
            err
        })?;

    Ok(CreatedThread { thread, post })
}

/// A thread with its category and a page of posts, oldest first.
pub fn get_thread<R>(repo: &R, id: i32, query: PageQuery) -> ServiceResult<ThreadDetail>
where
    R: ForumReader + UserReader + ?Sized,
{
    let thread = load_thread(repo, id)?;
    let category = repo
        .get_category_by_id(thread.category_id)?
        .ok_or(ServiceError::NotFound)?;
    let page = query.page.unwrap_or(1).max(1);

    let (total, posts) = repo.list_posts(
        thread.id,
        Some(Pagination {
            page,
            per_page: DEFAULT_ITEMS_PER_PAGE,
        }),
    )?;
    let authors = authors(repo, posts.iter().map(|p| p.author_id).collect())?;

    let items = posts
        .into_iter()
        .map(|post| PostView {
            author: authors.get(&post.author_id).cloned(),
            post,
        })
        .collect();

    Ok(ThreadDetail {
        thread,
        category,
        posts: Paginated::new(items, page, total),
    })
}

/// Replies to a thread. Locked threads accept no posts.
pub fn create_post<R>(
    repo: &R,
    user: &AuthenticatedUser,
    thread_id: i32,
    form: PostForm,
) -> ServiceResult<Post>
where
    R: ForumReader + ForumWriter + ?Sized,
{
    let author_id = current_user_id(user)?;
    let thread = load_thread(repo, thread_id)?;
    if thread.is_locked {
        log::warn!("User {author_id} tried to post to locked thread {}", thread.id);
        return Err(ServiceError::Forbidden);
    }
    let body = PostBody::try_from(form)?;

    Ok(repo.create_post(&NewPost {
        thread_id: thread.id,
        author_id,
        body,
        created_at: Utc::now().naive_utc(),
    })?)
}

/// Edits a post; only its author may do so.
pub fn update_post<R>(
    repo: &R,
    user: &AuthenticatedUser,
    post_id: i32,
    form: PostForm,
) -> ServiceResult<Post>
where
    R: ForumReader + ForumWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let post = load_post(repo, post_id)?;
    if post.author_id != user_id {
        return Err(ServiceError::Forbidden);
    }
    let body = PostBody::try_from(form)?;

    Ok(repo.update_post(post.id, &body, Utc::now().naive_utc())?)
}

/// Removes a reply. The opening post goes only with its thread.
pub fn delete_post<R>(repo: &R, user: &AuthenticatedUser, post_id: i32) -> ServiceResult<()>
where
    R: ForumReader + ForumWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let post = load_post(repo, post_id)?;
    if post.author_id != user_id && !user.is_admin() {
        return Err(ServiceError::Forbidden);
    }
    if repo.first_post_id(post.thread_id)? == Some(post.id) {
        return Err(ServiceError::Forbidden);
    }

    repo.delete_post(post.id)?;
    Ok(())
}

/// Deletes a thread and its posts. Event threads are admin only.
pub fn delete_thread<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: ForumReader + ForumWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let thread = load_thread(repo, id)?;
    let allowed = if thread.event_id.is_some() {
        user.is_admin()
    } else {
        thread.author_id == user_id || user.is_admin()
    };
    if !allowed {
        return Err(ServiceError::Forbidden);
    }

    repo.delete_thread(thread.id)?;
    log::info!("User {user_id} deleted thread {}", thread.id);
    Ok(())
}

/// Admin only: pins or locks a thread.
pub fn moderate_thread<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: ModerateThreadForm,
) -> ServiceResult<Thread>
where
    R: ForumReader + ForumWriter + ?Sized,
{
    ensure_role(user, ADMIN_ROLE)?;
    let thread = load_thread(repo, id)?;

    Ok(repo.moderate_thread(thread.id, form.into())?)
}
