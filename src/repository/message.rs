//! Repository implementation for direct messages.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use diesel::dsl::{exists, min};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::message::{Message, NewMessage};
use crate::domain::types::{MessageId, UserId};
use crate::models::message::{Message as DbMessage, NewMessage as DbNewMessage};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::user::like_pattern;
use crate::repository::{
    ConversationLimit, DieselRepository, MessageFolder, MessageListQuery, MessageListing,
    MessageReader, MessageSort, MessageWriter, Pagination,
};

fn into_domain(messages: Vec<DbMessage>) -> RepositoryResult<Vec<Message>> {
    messages
        .into_iter()
        .map(|message| Message::try_from(message).map_err(RepositoryError::from))
        .collect()
}

fn conversation_exists(conn: &mut SqliteConnection, a: i32, b: i32) -> QueryResult<bool> {
    use crate::schema::messages;

    diesel::select(exists(
        messages::table.filter(
            messages::sender_id
                .eq(a)
                .and(messages::recipient_id.eq(b))
                .or(messages::sender_id.eq(b).and(messages::recipient_id.eq(a))),
        ),
    ))
    .get_result::<bool>(conn)
}

/// Number of distinct users to whom `user_id` sent the first message of
/// their conversation at or after `since`.
fn conversations_started_since(
    conn: &mut SqliteConnection,
    user_id: i32,
    since: NaiveDateTime,
) -> QueryResult<usize> {
    use crate::schema::messages;

    let recent = messages::table
        .filter(messages::sender_id.eq(user_id))
        .filter(messages::created_at.ge(since))
        .select((messages::id, messages::recipient_id))
        .load::<(i32, i32)>(conn)?;

    let recent_ids = recent.iter().map(|(id, _)| *id).collect::<HashSet<i32>>();
    let recipients = recent
        .iter()
        .map(|(_, recipient)| *recipient)
        .collect::<HashSet<i32>>();

    let mut started = 0;
    for recipient in recipients {
        let first_id = messages::table
            .filter(
                messages::sender_id
                    .eq(user_id)
                    .and(messages::recipient_id.eq(recipient))
                    .or(messages::sender_id
                        .eq(recipient)
                        .and(messages::recipient_id.eq(user_id))),
            )
            .select(min(messages::id))
            .first::<Option<i32>>(conn)?;

        if first_id.is_some_and(|id| recent_ids.contains(&id)) {
            started += 1;
        }
    }

    Ok(started)
}

impl MessageReader for DieselRepository {
    fn get_message(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let db_message = messages::table
            .find(id.get())
            .first::<DbMessage>(&mut conn)
            .optional()?;

        db_message
            .map(|message| Message::try_from(message).map_err(RepositoryError::from))
            .transpose()
    }

    fn list_messages(&self, query: MessageListQuery) -> RepositoryResult<MessageListing> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let user_id = query.user_id.get();

        let folder_builder = || {
            let items = messages::table.into_boxed::<Sqlite>();
            match query.folder {
                MessageFolder::Inbox => items
                    .filter(messages::recipient_id.eq(user_id))
                    .filter(messages::deleted_by_recipient.eq(false)),
                MessageFolder::Sent => items
                    .filter(messages::sender_id.eq(user_id))
                    .filter(messages::deleted_by_sender.eq(false)),
            }
        };

        let query_builder = || {
            let mut items = folder_builder();

            if query.unread_only {
                items = items.filter(messages::is_read.eq(false));
            }
            if let Some(counterparty) = query.counterparty {
                items = match query.folder {
                    MessageFolder::Inbox => items.filter(messages::sender_id.eq(counterparty.get())),
                    MessageFolder::Sent => {
                        items.filter(messages::recipient_id.eq(counterparty.get()))
                    }
                };
            }
            if let Some(search) = &query.search {
                items = items.filter(messages::body.like(like_pattern(search, true)).escape('\\'));
            }
            items
        };

        // Get the total count before applying the window and pagination
        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;
        let mut visible = total;

        let mut items = query_builder();

        if let Some(window) = query.window {
            let window_ids = folder_builder()
                .select(messages::id)
                .order((messages::created_at.desc(), messages::id.desc()))
                .limit(i64::try_from(window).unwrap_or(i64::MAX))
                .load::<i32>(&mut conn)?;
            visible = query_builder()
                .filter(messages::id.eq_any(window_ids.clone()))
                .count()
                .get_result::<i64>(&mut conn)? as usize;
            items = items.filter(messages::id.eq_any(window_ids));
        }

        items = match query.sort {
            MessageSort::Newest => items.order((messages::created_at.desc(), messages::id.desc())),
            MessageSort::Oldest => items.order((messages::created_at.asc(), messages::id.asc())),
            MessageSort::UnreadFirst => items.order((
                messages::is_read.asc(),
                messages::created_at.desc(),
                messages::id.desc(),
            )),
        };

        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let db_messages = items.load::<DbMessage>(&mut conn)?;

        Ok(MessageListing {
            total,
            visible,
            messages: into_domain(db_messages)?,
        })
    }

    fn list_user_messages(&self, user_id: UserId) -> RepositoryResult<Vec<Message>> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let user_id = user_id.get();

        let db_messages = messages::table
            .filter(
                messages::sender_id
                    .eq(user_id)
                    .and(messages::deleted_by_sender.eq(false))
                    .or(messages::recipient_id
                        .eq(user_id)
                        .and(messages::deleted_by_recipient.eq(false))),
            )
            .order((messages::created_at.desc(), messages::id.desc()))
            .load::<DbMessage>(&mut conn)?;

        into_domain(db_messages)
    }

    fn list_conversation(
        &self,
        user_id: UserId,
        other_id: UserId,
        pagination: Option<Pagination>,
    ) -> RepositoryResult<(usize, Vec<Message>)> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let (user_id, other_id) = (user_id.get(), other_id.get());

        let query_builder = || {
            messages::table
                .filter(
                    messages::sender_id
                        .eq(user_id)
                        .and(messages::recipient_id.eq(other_id))
                        .and(messages::deleted_by_sender.eq(false))
                        .or(messages::sender_id
                            .eq(other_id)
                            .and(messages::recipient_id.eq(user_id))
                            .and(messages::deleted_by_recipient.eq(false))),
                )
                .into_boxed::<Sqlite>()
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order((messages::created_at.asc(), messages::id.asc()));
        if let Some(pagination) = &pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let db_messages = items.load::<DbMessage>(&mut conn)?;

        Ok((total, into_domain(db_messages)?))
    }

    fn count_unread(&self, user_id: UserId) -> RepositoryResult<usize> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let count = messages::table
            .filter(messages::recipient_id.eq(user_id.get()))
            .filter(messages::is_read.eq(false))
            .filter(messages::deleted_by_recipient.eq(false))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count as usize)
    }
}

impl MessageWriter for DieselRepository {
    fn create_message(
        &self,
        new_message: &NewMessage,
        limit: Option<ConversationLimit>,
    ) -> RepositoryResult<Message> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let insertable: DbNewMessage = new_message.into();
        let sender_id = new_message.sender_id.get();
        let recipient_id = new_message.recipient_id.get();

        // IMMEDIATE takes the write lock before the count, so two sends from
        // the same member cannot both pass the limit.
        let db_message = conn.immediate_transaction::<DbMessage, RepositoryError, _>(|conn| {
            if let Some(limit) = limit
                && !conversation_exists(conn, sender_id, recipient_id)?
            {
                let started = conversations_started_since(conn, sender_id, limit.since)?;
                if started >= limit.max {
                    return Err(RepositoryError::LimitReached(format!(
                        "{started} of {} new conversations already started",
                        limit.max
                    )));
                }
            }

            Ok(diesel::insert_into(messages::table)
                .values(&insertable)
                .get_result::<DbMessage>(conn)?)
        })?;

        Message::try_from(db_message).map_err(RepositoryError::from)
    }

    fn mark_message_read(&self, id: MessageId, at: NaiveDateTime) -> RepositoryResult<Message> {
        use crate::schema::messages;

        let mut conn = self.conn()?;

        diesel::update(
            messages::table
                .find(id.get())
                .filter(messages::is_read.eq(false)),
        )
        .set((messages::is_read.eq(true), messages::read_at.eq(Some(at))))
        .execute(&mut conn)?;

        let db_message = messages::table
            .find(id.get())
            .first::<DbMessage>(&mut conn)?;

        Message::try_from(db_message).map_err(RepositoryError::from)
    }

    fn mark_conversation_read(
        &self,
        recipient_id: UserId,
        sender_id: UserId,
        at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let updated = diesel::update(
            messages::table
                .filter(messages::recipient_id.eq(recipient_id.get()))
                .filter(messages::sender_id.eq(sender_id.get()))
                .filter(messages::is_read.eq(false)),
        )
        .set((messages::is_read.eq(true), messages::read_at.eq(Some(at))))
        .execute(&mut conn)?;

        Ok(updated)
    }

    fn delete_message_for(&self, id: MessageId, user_id: UserId) -> RepositoryResult<()> {
        use crate::schema::messages;

        let mut conn = self.conn()?;
        let db_message = messages::table
            .find(id.get())
            .first::<DbMessage>(&mut conn)?;

        if db_message.sender_id == user_id.get() {
            diesel::update(messages::table.find(id.get()))
                .set(messages::deleted_by_sender.eq(true))
                .execute(&mut conn)?;
        } else if db_message.recipient_id == user_id.get() {
            diesel::update(messages::table.find(id.get()))
                .set(messages::deleted_by_recipient.eq(true))
                .execute(&mut conn)?;
        } else {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
