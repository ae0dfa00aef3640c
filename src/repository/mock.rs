//! Mock repository implementations for isolating services in tests.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use mockall::mock;

use crate::domain::event::{
    AttendeeCounts, Event, EventAttendee, EventDetails, NewEvent, RsvpStatus,
};
use crate::domain::forum::{
    Category, EventThreadContent, NewCategory, NewPost, NewThread, Post, Thread, ThreadModeration,
};
use crate::domain::message::{Message, NewMessage};
use crate::domain::types::{
    CategoryId, EventId, MessageId, PostBody, PostId, Slug, ThreadId, UserId,
};
use crate::domain::user::{NewUser, UpdateProfile, User};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ConversationLimit, EventListQuery, EventReader, EventWriter, ForumReader, ForumWriter,
    MessageListQuery, MessageListing, MessageReader, MessageWriter, Pagination, ThreadListQuery,
    UserListQuery, UserReader, UserWriter,
};

mock! {
    pub Repository {}

    impl UserReader for Repository {
        fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
        fn get_user_by_login(&self, login: &str) -> RepositoryResult<Option<User>>;
        fn get_users_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>>;
        fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)>;
    }

    impl UserWriter for Repository {
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

    impl MessageReader for Repository {
        fn get_message(&self, id: MessageId) -> RepositoryResult<Option<Message>>;
        fn list_messages(&self, query: MessageListQuery) -> RepositoryResult<MessageListing>;
        fn list_user_messages(&self, user_id: UserId) -> RepositoryResult<Vec<Message>>;
        fn list_conversation(
            &self,
            user_id: UserId,
            other_id: UserId,
            pagination: Option<Pagination>,
        ) -> RepositoryResult<(usize, Vec<Message>)>;
        fn count_unread(&self, user_id: UserId) -> RepositoryResult<usize>;
    }

    impl MessageWriter for Repository {
        fn create_message(
            &self,
            new_message: &NewMessage,
            limit: Option<ConversationLimit>,
        ) -> RepositoryResult<Message>;
        fn mark_message_read(&self, id: MessageId, at: NaiveDateTime) -> RepositoryResult<Message>;
        fn mark_conversation_read(
            &self,
            recipient_id: UserId,
            sender_id: UserId,
            at: NaiveDateTime,
        ) -> RepositoryResult<usize>;
        fn delete_message_for(&self, id: MessageId, user_id: UserId) -> RepositoryResult<()>;
    }

    impl EventReader for Repository {
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

    impl EventWriter for Repository {
        fn create_event(&self, new_event: &NewEvent) -> RepositoryResult<Event>;
        fn update_event(
            &self,
            id: EventId,
            details: &EventDetails,
            updated_at: NaiveDateTime,
        ) -> RepositoryResult<Event>;
        fn delete_event(&self, id: EventId) -> RepositoryResult<Option<Thread>>;
        fn upsert_attendee(
            &self,
            id: EventId,
            user_id: UserId,
            status: RsvpStatus,
            at: NaiveDateTime,
        ) -> RepositoryResult<EventAttendee>;
        fn remove_attendee(&self, id: EventId, user_id: UserId) -> RepositoryResult<bool>;
    }

    impl ForumReader for Repository {
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

    impl ForumWriter for Repository {
        fn create_category(&self, new_category: &NewCategory) -> RepositoryResult<Category>;
        fn create_thread(&self, new_thread: &NewThread) -> RepositoryResult<(Thread, Post)>;
        fn delete_thread(&self, id: ThreadId) -> RepositoryResult<()>;
        fn moderate_thread(
            &self,
            id: ThreadId,
            moderation: ThreadModeration,
        ) -> RepositoryResult<Thread>;
        fn create_post(&self, new_post: &NewPost) -> RepositoryResult<Post>;
        fn update_post(
            &self,
            id: PostId,
            body: &PostBody,
            updated_at: NaiveDateTime,
        ) -> RepositoryResult<Post>;
        fn delete_post(&self, id: PostId) -> RepositoryResult<()>;
        fn sync_event_thread(&self, content: &EventThreadContent) -> RepositoryResult<Thread>;
    }
}
