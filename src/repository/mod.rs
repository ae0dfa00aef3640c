use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::event::{AttendeeCounts, Event, EventAttendee, EventDetails, NewEvent, RsvpStatus};
use crate::domain::forum::{
    Category, EventThreadContent, NewCategory, NewPost, NewThread, Post, Thread, ThreadModeration,
};
use crate::domain::message::{Message, NewMessage};
use crate::domain::types::{
    CategoryId, EventId, MessageId, PostBody, PostId, Slug, ThreadId, UserId,
};
use crate::domain::user::{NewUser, UpdateProfile, User};
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod event;
pub mod forum;
pub mod message;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod user;

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Row offset of the first item on the page; pages are 1-based.
    /// Saturates at `i64::MAX` so oversized page numbers yield an empty page.
    pub fn offset(&self) -> i64 {
        let offset = self.page.max(1).saturating_sub(1).saturating_mul(self.per_page);
        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    pub fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }
}

/// Cap on the new conversations a member may start within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationLimit {
    pub max: usize,
    pub since: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserListQuery {
    pub exclude: Option<UserId>,
    pub car_make: Option<String>,
    pub location: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl UserListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, user_id: UserId) -> Self {
        self.exclude = Some(user_id);
        self
    }

    pub fn car_make(mut self, car_make: impl Into<String>) -> Self {
        self.car_make = Some(car_make.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn age_range(mut self, min_age: Option<i32>, max_age: Option<i32>) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Which side of the mailbox to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFolder {
    #[default]
    Inbox,
    Sent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSort {
    #[default]
    Newest,
    Oldest,
    UnreadFirst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageListQuery {
    pub user_id: UserId,
    pub folder: MessageFolder,
    pub unread_only: bool,
    pub counterparty: Option<UserId>,
    pub search: Option<String>,
    pub sort: MessageSort,
    /// Restricts the result to messages among the newest `n` of the folder,
    /// regardless of the other filters.
    pub window: Option<usize>,
    pub pagination: Option<Pagination>,
}

impl MessageListQuery {
    pub fn new(user_id: UserId, folder: MessageFolder) -> Self {
        Self {
            user_id,
            folder,
            unread_only: false,
            counterparty: None,
            search: None,
            sort: MessageSort::Newest,
            window: None,
            pagination: None,
        }
    }

    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    pub fn counterparty(mut self, user_id: UserId) -> Self {
        self.counterparty = Some(user_id);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sort(mut self, sort: MessageSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn window(mut self, newest: usize) -> Self {
        self.window = Some(newest);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Result of [`MessageReader::list_messages`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageListing {
    /// Messages matching the filters, ignoring the window.
    pub total: usize,
    /// Matching messages that fall inside the window.
    pub visible: usize,
    /// The requested page of visible messages.
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventListQuery {
    /// Only events starting at or after this moment, ordered soonest first.
    pub starting_after: Option<NaiveDateTime>,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl EventListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upcoming(mut self, now: NaiveDateTime) -> Self {
        self.starting_after = Some(now);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadListQuery {
    pub category_id: CategoryId,
    pub pagination: Option<Pagination>,
}

impl ThreadListQuery {
    pub fn new(category_id: CategoryId) -> Self {
        Self {
            category_id,
            pagination: None,
        }
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    /// Looks a user up by username or email.
    fn get_user_by_login(&self, login: &str) -> RepositoryResult<Option<User>>;
    fn get_users_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>>;
    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    fn update_profile(
        &self,
        id: UserId,
        updates: &UpdateProfile,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<User>;
    fn set_premium(&self, id: UserId, is_premium: bool) -> RepositoryResult<User>;
    fn touch_last_active(&self, id: UserId, at: NaiveDateTime) -> RepositoryResult<()>;
}

pub trait MessageReader {
    fn get_message(&self, id: MessageId) -> RepositoryResult<Option<Message>>;
    fn list_messages(&self, query: MessageListQuery) -> RepositoryResult<MessageListing>;
    /// All messages visible to the user, newest first.
    fn list_user_messages(&self, user_id: UserId) -> RepositoryResult<Vec<Message>>;
    /// Messages between two users visible to `user_id`, oldest first.
    fn list_conversation(
        &self,
        user_id: UserId,
        other_id: UserId,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<Message>)>;
    fn count_unread(&self, user_id: UserId) -> RepositoryResult<usize>;
}

pub trait MessageWriter {
    /// Inserts the message. With a `limit`, a message opening a new
    /// conversation fails with [`errors::RepositoryError::LimitReached`] once
    /// the sender has started `limit.max` conversations since `limit.since`.
    /// The check and the insert run in one transaction.
    fn create_message(
        &self,
        new_message: &NewMessage,
        limit: Option<ConversationLimit>,
    ) -> RepositoryResult<Message>;
    fn mark_message_read(&self, id: MessageId, at: NaiveDateTime) -> RepositoryResult<Message>;
    /// Marks every unread message from `sender_id` to `recipient_id` as read.
    fn mark_conversation_read(
        &self,
        recipient_id: UserId,
        sender_id: UserId,
        at: NaiveDateTime,
    ) -> RepositoryResult<usize>;
    /// Hides the message from the given participant's mailbox.
    fn delete_message_for(&self, id: MessageId, user_id: UserId) -> RepositoryResult<()>;
}

pub trait EventReader {
    fn get_event(&self, id: EventId) -> RepositoryResult<Option<Event>>;
    fn list_events(&self, query: EventListQuery) -> RepositoryResult<(usize, Vec<Event>)>;
    fn attendee_counts(
        &self,
        ids: &[EventId],
    ) -> RepositoryResult<HashMap<EventId, AttendeeCounts>>;
    fn list_attendees(
        &self,
        id: EventId,
        status: Option<RsvpStatus>,
    ) -> RepositoryResult<Vec<(EventAttendee, User)>>;
}

pub trait EventWriter {
    /// Inserts the event and RSVPs its creator as going.
    fn create_event(&self, new_event: &NewEvent) -> RepositoryResult<Event>;
    fn update_event(
        &self,
        id: EventId,
        details: &EventDetails,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Event>;
    /// Deletes the event with its RSVPs and closes its discussion thread in
    /// one transaction. Returns the closed thread, if the event had one.
    fn delete_event(&self, id: EventId) -> RepositoryResult<Option<Thread>>;
    /// Inserts or replaces an RSVP. Going RSVPs beyond capacity fail with
    /// [`errors::RepositoryError::ConstraintViolation`].
    fn upsert_attendee(
        &self,
        id: EventId,
        user_id: UserId,
        status: RsvpStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<EventAttendee>;
    fn remove_attendee(&self, id: EventId, user_id: UserId) -> RepositoryResult<bool>;
}

pub trait ForumReader {
    /// Categories ordered by position then name, with their thread counts.
    fn list_categories(&self) -> RepositoryResult<Vec<(Category, usize)>>;
    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;
    fn get_category_by_slug(&self, slug: &Slug) -> RepositoryResult<Option<Category>>;
    fn list_threads(&self, query: ThreadListQuery) -> RepositoryResult<(usize, Vec<Thread>)>;
    fn get_thread(&self, id: ThreadId) -> RepositoryResult<Option<Thread>>;
    fn get_thread_by_event(&self, event_id: EventId) -> RepositoryResult<Option<Thread>>;
    fn list_posts(
        &self,
        thread_id: ThreadId,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<Post>)>;
    fn get_post(&self, id: PostId) -> RepositoryResult<Option<Post>>;
    fn first_post_id(&self, thread_id: ThreadId) -> RepositoryResult<Option<PostId>>;
}

pub trait ForumWriter {
    fn create_category(&self, new_category: &NewCategory) -> RepositoryResult<Category>;
    /// Creates the thread and its opening post in one transaction.
    fn create_thread(&self, new_thread: &NewThread) -> RepositoryResult<(Thread, Post)>;
    fn delete_thread(&self, id: ThreadId) -> RepositoryResult<()>;
    fn moderate_thread(
        &self,
        id: ThreadId,
        moderation: ThreadModeration,
    ) -> RepositoryResult<Thread>;
    /// Appends a post, bumping the thread's counter and activity time.
    fn create_post(&self, new_post: &NewPost) -> RepositoryResult<Post>;
    fn update_post(
        &self,
        id: PostId,
        body: &PostBody,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Post>;
    fn delete_post(&self, id: PostId) -> RepositoryResult<()>;
    /// Creates or refreshes the discussion thread linked to an event.
    fn sync_event_thread(&self, content: &EventThreadContent) -> RepositoryResult<Thread>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offsets_are_one_based() {
        let first = Pagination { page: 1, per_page: 20 };
        let third = Pagination { page: 3, per_page: 20 };
        let zero = Pagination { page: 0, per_page: 20 };
        assert_eq!(first.offset(), 0);
        assert_eq!(third.offset(), 40);
        assert_eq!(zero.offset(), 0);
        assert_eq!(third.limit(), 20);
    }

    #[test]
    fn pagination_offset_saturates_for_huge_pages() {
        let last = Pagination {
            page: usize::MAX,
            per_page: 20,
        };
        assert_eq!(last.offset(), i64::MAX);
        assert_eq!(last.limit(), 20);
    }

    #[test]
    fn message_query_builder_sets_filters() {
        let user = UserId::new(1).unwrap();
        let other = UserId::new(2).unwrap();
        let query = MessageListQuery::new(user, MessageFolder::Inbox)
            .unread_only()
            .counterparty(other)
            .sort(MessageSort::Oldest)
            .window(20)
            .paginate(2, 10);
        assert!(query.unread_only);
        assert_eq!(query.counterparty, Some(other));
        assert_eq!(query.sort, MessageSort::Oldest);
        assert_eq!(query.window, Some(20));
        assert_eq!(query.pagination, Some(Pagination { page: 2, per_page: 10 }));
    }
}
