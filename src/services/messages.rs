//! Direct messaging with the free/premium gating rules.
//!
//! Free members may start a limited number of new conversations per rolling
//! day and only see the newest part of their inbox. Search, sender filters
//! and unread-first sorting are premium features.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use crate::domain::message::{ConversationSummary, Message, NewMessage};
use crate::domain::types::{MessageId, UserId};
use crate::domain::user::{User, UserSummary};
use crate::dto::message::{ConversationView, MessagePage, MessageQuery, MessageView, UnreadCount};
use crate::forms::message::{SendMessageForm, SendMessagePayload};
use crate::models::auth::AuthenticatedUser;
use crate::models::config::MessagingPolicy;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::errors::RepositoryError;
use crate::repository::{
    ConversationLimit, MessageFolder, MessageListQuery, MessageReader, MessageSort, MessageWriter,
    Pagination, UserReader,
};
use crate::services::{ServiceError, ServiceResult, current_user_id};

fn load_caller<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<User>
where
    R: UserReader + ?Sized,
{
    let user_id = current_user_id(user)?;
    repo.get_user_by_id(user_id)?
        .ok_or(ServiceError::Unauthorized)
}

fn summaries<R>(repo: &R, ids: Vec<UserId>) -> ServiceResult<HashMap<UserId, UserSummary>>
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

/// Sends a message, enforcing the daily new-conversation limit for free members.
pub fn send_message<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: SendMessageForm,
    policy: MessagingPolicy,
) -> ServiceResult<MessageView>
where
    R: UserReader + MessageWriter + ?Sized,
{
    let payload = SendMessagePayload::try_from(form)?;
    let sender = load_caller(repo, user)?;

    if payload.recipient_id == sender.id {
        return Err(ServiceError::Form(
            "you cannot send a message to yourself".to_string(),
        ));
    }

    let recipient = repo
        .get_user_by_id(payload.recipient_id)?
        .ok_or(ServiceError::NotFound)?;

    let now = Utc::now().naive_utc();
    let limit = (!sender.is_premium).then(|| ConversationLimit {
        max: policy.free_daily_conversations,
        since: now - Duration::hours(24),
    });

    let message = repo
        .create_message(
            &NewMessage {
                sender_id: sender.id,
                recipient_id: recipient.id,
                body: payload.body,
                created_at: now,
            },
            limit,
        )
        .map_err(|err| match err {
            RepositoryError::LimitReached(_) => {
                log::warn!(
                    "User {} reached the daily limit of {} new conversations",
                    sender.id,
                    policy.free_daily_conversations
                );
                ServiceError::PremiumRequired(format!(
                    "free members can start {} new conversations per day; upgrade to premium to start more",
                    policy.free_daily_conversations
                ))
            }
            err => {
                log::error!("Failed to send message from {}: {err}", sender.id);
                ServiceError::from(err)
            }
        })?;

    Ok(MessageView {
        message,
        counterparty: Some(UserSummary::from(&recipient)),
    })
}

/// Lists one mailbox folder with filters, sorting and free-tier gating.
pub fn list_messages<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: MessageQuery,
    policy: MessagingPolicy,
) -> ServiceResult<MessagePage>
where
    R: UserReader + MessageReader + ?Sized,
{
    let caller = load_caller(repo, user)?;

    let folder = query.folder.unwrap_or_default();
    let sort = query.sort.unwrap_or_default();
    let page = query.page.unwrap_or(1).max(1);
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let counterparty = query.from.map(UserId::new).transpose()?;

    if !caller.is_premium
        && (search.is_some() || counterparty.is_some() || sort == MessageSort::UnreadFirst)
    {
        log::warn!("User {} requested a premium inbox feature", caller.id);
        return Err(ServiceError::PremiumRequired(
            "search, sender filters and unread-first sorting require premium".to_string(),
        ));
    }

    let mut list_query = MessageListQuery::new(caller.id, folder)
        .sort(sort)
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if query.unread.unwrap_or(false) && folder == MessageFolder::Inbox {
        list_query = list_query.unread_only();
    }
    if let Some(counterparty) = counterparty {
        list_query = list_query.counterparty(counterparty);
    }
    if let Some(search) = search {
        list_query = list_query.search(search);
    }
    if !caller.is_premium && folder == MessageFolder::Inbox {
        list_query = list_query.window(policy.free_inbox_limit);
    }

    let listing = repo.list_messages(list_query)?;
    let hidden_count = listing.total.saturating_sub(listing.visible);

    let counterparties = summaries(
        repo,
        listing
            .messages
            .iter()
            .map(|message| message.counterparty(caller.id))
            .collect(),
    )?;

    let views = listing
        .messages
        .into_iter()
        .map(|message| MessageView {
            counterparty: counterparties.get(&message.counterparty(caller.id)).cloned(),
            message,
        })
        .collect();

    Ok(MessagePage {
        messages: Paginated::new(views, page, listing.visible),
        hidden_count,
        upgrade_required: hidden_count > 0,
    })
}

/// One entry per counterparty, most recent conversation first.
pub fn list_conversations<R>(
    repo: &R,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<ConversationSummary>>
where
    R: UserReader + MessageReader + ?Sized,
{
    let user_id = current_user_id(user)?;

    let mut order: Vec<UserId> = Vec::new();
    let mut latest: HashMap<UserId, (Message, usize)> = HashMap::new();

    for message in repo.list_user_messages(user_id)? {
        let other = message.counterparty(user_id);
        let unread = usize::from(message.recipient_id == user_id && !message.is_read);
        match latest.get_mut(&other) {
            Some((_, count)) => *count += unread,
            None => {
                order.push(other);
                latest.insert(other, (message, unread));
            }
        }
    }

    let users = summaries(repo, order.clone())?;

    Ok(order
        .into_iter()
        .filter_map(|other| {
            let with = users.get(&other)?.clone();
            let (last_message, unread_count) = latest.remove(&other)?;
            Some(ConversationSummary {
                with,
                last_message,
                unread_count,
            })
        })
        .collect())
}

/// Messages exchanged with `other_id`; incoming ones are marked as read.
pub fn get_conversation<R>(
    repo: &R,
    user: &AuthenticatedUser,
    other_id: i32,
    page: Option<usize>,
) -> ServiceResult<ConversationView>
where
    R: UserReader + MessageReader + MessageWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let other_id = UserId::new(other_id).map_err(|_| ServiceError::NotFound)?;
    let other = repo
        .get_user_by_id(other_id)?
        .ok_or(ServiceError::NotFound)?;
    let page = page.unwrap_or(1).max(1);

    repo.mark_conversation_read(user_id, other_id, Utc::now().naive_utc())?;

    let (total, messages) = repo.list_conversation(
        user_id,
        other_id,
        Some(Pagination {
            page,
            per_page: DEFAULT_ITEMS_PER_PAGE,
        }),
    )?;

    Ok(ConversationView {
        with: UserSummary::from(&other),
        messages: Paginated::new(messages, page, total),
    })
}

/// Marks a received message as read. Only its recipient may do so.
pub fn mark_read<R>(repo: &R, user: &AuthenticatedUser, message_id: i32) -> ServiceResult<Message>
where
    R: MessageReader + MessageWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let message_id = MessageId::new(message_id).map_err(|_| ServiceError::NotFound)?;
    let message = repo
        .get_message(message_id)?
        .ok_or(ServiceError::NotFound)?;

    if message.recipient_id != user_id {
        return Err(if message.sender_id == user_id {
            ServiceError::Forbidden
        } else {
            ServiceError::NotFound
        });
    }
    if message.is_read {
        return Ok(message);
    }

    Ok(repo.mark_message_read(message_id, Utc::now().naive_utc())?)
}

/// Hides a message from the caller's side of the conversation.
pub fn delete_message<R>(repo: &R, user: &AuthenticatedUser, message_id: i32) -> ServiceResult<()>
where
    R: MessageReader + MessageWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let message_id = MessageId::new(message_id).map_err(|_| ServiceError::NotFound)?;
    let message = repo
        .get_message(message_id)?
        .ok_or(ServiceError::NotFound)?;

    if message.sender_id != user_id && message.recipient_id != user_id {
        return Err(ServiceError::NotFound);
    }

    repo.delete_message_for(message_id, user_id)?;
    Ok(())
}

pub fn unread_count<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<UnreadCount>
where
    R: MessageReader + ?Sized,
{
    let user_id = current_user_id(user)?;
    Ok(UnreadCount {
        unread: repo.count_unread(user_id)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MessageBody;
    use crate::repository::MessageListing;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{member, timestamp, user};

    fn message(id: i32, sender: i32, recipient: i32, is_read: bool) -> Message {
        Message {
            id: MessageId::new(id).unwrap(),
            sender_id: UserId::new(sender).unwrap(),
            recipient_id: UserId::new(recipient).unwrap(),
            body: MessageBody::new(format!("message {id}")).unwrap(),
            is_read,
            created_at: timestamp(),
            read_at: None,
        }
    }

    fn send_form(recipient_id: i32) -> SendMessageForm {
        SendMessageForm {
            recipient_id,
            body: "Nice Miata!".to_string(),
        }
    }

    fn repo_with_users(sender_premium: bool) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(move |id| Ok(Some(user(id.get(), id.get() == 1 && sender_premium))));
        repo
    }

    #[test]
    fn free_user_cannot_exceed_daily_new_conversations() {
        let mut repo = repo_with_users(false);
        repo.expect_create_message()
            .times(1)
            .returning(|_, _| Err(RepositoryError::LimitReached("5 of 5".to_string())));

        let result = send_message(&repo, &member(1), send_form(2), MessagingPolicy::default());

        assert!(matches!(result, Err(ServiceError::PremiumRequired(_))));
    }

    #[test]
    fn free_user_sends_with_the_daily_limit() {
        let mut repo = repo_with_users(false);
        repo.expect_create_message()
            .withf(|new_message, limit| {
                new_message.recipient_id.get() == 2
                    && limit.is_some_and(|limit| {
                        limit.max == MessagingPolicy::default().free_daily_conversations
                    })
            })
            .times(1)
            .returning(|_, _| Ok(message(10, 1, 2, false)));

        let view = send_message(&repo, &member(1), send_form(2), MessagingPolicy::default())
            .unwrap();

        assert_eq!(view.counterparty.unwrap().id.get(), 2);
    }

    #[test]
    fn premium_users_are_not_limited() {
        let mut repo = repo_with_users(true);
        repo.expect_create_message()
            .withf(|_, limit| limit.is_none())
            .times(1)
            .returning(|_, _| Ok(message(12, 1, 2, false)));

        assert!(send_message(&repo, &member(1), send_form(2), MessagingPolicy::default()).is_ok());
    }

    #[test]
    fn other_send_failures_are_not_premium_errors() {
        let mut repo = repo_with_users(false);
        repo.expect_create_message()
            .returning(|_, _| Err(RepositoryError::DatabaseError("disk full".to_string())));

        let result = send_message(&repo, &member(1), send_form(2), MessagingPolicy::default());

        assert!(matches!(result, Err(ServiceError::Repository(_))));
    }

    #[test]
    fn messaging_yourself_is_rejected() {
        let repo = repo_with_users(false);

        let result = send_message(&repo, &member(1), send_form(1), MessagingPolicy::default());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn free_user_search_requires_premium() {
        let mut repo = repo_with_users(false);
        repo.expect_list_messages().times(0);

        let result = list_messages(
            &repo,
            &member(1),
            MessageQuery {
                search: Some("track day".to_string()),
                ..Default::default()
            },
            MessagingPolicy::default(),
        );

        assert!(matches!(result, Err(ServiceError::PremiumRequired(_))));
    }

    #[test]
    fn free_user_unread_first_requires_premium() {
        let mut repo = repo_with_users(false);
        repo.expect_list_messages().times(0);

        let result = list_messages(
            &repo,
            &member(1),
            MessageQuery {
                sort: Some(MessageSort::UnreadFirst),
                ..Default::default()
            },
            MessagingPolicy::default(),
        );

        assert!(matches!(result, Err(ServiceError::PremiumRequired(_))));
    }

    #[test]
    fn free_inbox_is_windowed_and_reports_hidden_messages() {
        let mut repo = repo_with_users(false);
        repo.expect_list_messages()
            .withf(|query| query.window == Some(20) && query.folder == MessageFolder::Inbox)
            .times(1)
            .returning(|_| {
                Ok(MessageListing {
                    total: 25,
                    visible: 20,
                    messages: (1..=20).map(|id| message(id, 2, 1, false)).collect(),
                })
            });
        repo.expect_get_users_by_ids()
            .returning(|ids| Ok(ids.iter().map(|id| user(id.get(), false)).collect()));

        let page = list_messages(
            &repo,
            &member(1),
            MessageQuery::default(),
            MessagingPolicy::default(),
        )
        .unwrap();

        assert_eq!(page.hidden_count, 5);
        assert!(page.upgrade_required);
        assert_eq!(page.messages.total, 20);
        assert_eq!(page.messages.items.len(), 20);
        assert_eq!(
            page.messages.items[0]
                .counterparty
                .as_ref()
                .map(|c| c.id.get()),
            Some(2)
        );
    }

    #[test]
    fn premium_inbox_is_not_windowed() {
        let mut repo = repo_with_users(true);
        repo.expect_list_messages()
            .withf(|query| query.window.is_none() && query.search.as_deref() == Some("e30"))
            .times(1)
            .returning(|_| {
                Ok(MessageListing {
                    total: 1,
                    visible: 1,
                    messages: vec![message(1, 2, 1, false)],
                })
            });
        repo.expect_get_users_by_ids()
            .returning(|ids| Ok(ids.iter().map(|id| user(id.get(), false)).collect()));

        let page = list_messages(
            &repo,
            &member(1),
            MessageQuery {
                search: Some(" e30 ".to_string()),
                ..Default::default()
            },
            MessagingPolicy::default(),
        )
        .unwrap();

        assert_eq!(page.hidden_count, 0);
        assert!(!page.upgrade_required);
    }

    #[test]
    fn conversations_group_by_counterparty() {
        let mut repo = MockRepository::new();
        repo.expect_list_user_messages().returning(|_| {
            Ok(vec![
                message(5, 3, 1, false),
                message(4, 2, 1, false),
                message(3, 1, 3, true),
                message(2, 2, 1, false),
                message(1, 1, 2, true),
            ])
        });
        repo.expect_get_users_by_ids()
            .returning(|ids| Ok(ids.iter().map(|id| user(id.get(), false)).collect()));

        let conversations = list_conversations(&repo, &member(1)).unwrap();

        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].with.id.get(), 3);
        assert_eq!(conversations[0].unread_count, 1);
        assert_eq!(conversations[1].with.id.get(), 2);
        assert_eq!(conversations[1].last_message.id.get(), 4);
        assert_eq!(conversations[1].unread_count, 2);
    }

    #[test]
    fn only_recipient_can_mark_read() {
        let mut repo = MockRepository::new();
        repo.expect_get_message()
            .returning(|_| Ok(Some(message(7, 1, 2, false))));
        repo.expect_mark_message_read().times(0);

        assert!(matches!(
            mark_read(&repo, &member(1), 7),
            Err(ServiceError::Forbidden)
        ));
        assert!(matches!(
            mark_read(&repo, &member(3), 7),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut repo = MockRepository::new();
        repo.expect_get_message()
            .returning(|_| Ok(Some(message(7, 1, 2, true))));
        repo.expect_mark_message_read().times(0);

        let message = mark_read(&repo, &member(2), 7).unwrap();

        assert!(message.is_read);
    }

    #[test]
    fn strangers_cannot_delete_messages() {
        let mut repo = MockRepository::new();
        repo.expect_get_message()
            .returning(|_| Ok(Some(message(7, 1, 2, false))));
        repo.expect_delete_message_for().times(0);

        assert!(matches!(
            delete_message(&repo, &member(3), 7),
            Err(ServiceError::NotFound)
        ));
    }
}
