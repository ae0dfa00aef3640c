use chrono::Duration;

use carmatch::domain::event::{EventDetails, NewEvent, RsvpStatus};
use carmatch::domain::forum::{EventThreadContent, NewCategory, NewPost, NewThread};
use carmatch::domain::message::NewMessage;
use carmatch::domain::types::{
    CategoryName, DisplayName, EventLocation, EventTitle, MessageBody, PostBody, Slug,
    ThreadTitle, UserEmail, UserId, Username,
};
use carmatch::domain::user::NewUser;
use carmatch::repository::errors::RepositoryError;
use carmatch::repository::{
    ConversationLimit, DieselRepository, EventReader, EventWriter, ForumReader, ForumWriter,
    MessageFolder, MessageListQuery, MessageReader, MessageWriter, UserListQuery, UserReader,
    UserWriter,
};

mod common;

use common::{create_user, now};

fn send(repo: &DieselRepository, from: UserId, to: UserId, body: &str, minutes_ago: i64) {
    repo.create_message(
        &NewMessage {
            sender_id: from,
            recipient_id: to,
            body: MessageBody::new(body).unwrap(),
            created_at: now() - Duration::minutes(minutes_ago),
        },
        None,
    )
    .unwrap();
}

fn send_limited(
    repo: &DieselRepository,
    from: UserId,
    to: UserId,
    max: usize,
) -> Result<(), RepositoryError> {
    repo.create_message(
        &NewMessage {
            sender_id: from,
            recipient_id: to,
            body: MessageBody::new("hey there").unwrap(),
            created_at: now(),
        },
        Some(ConversationLimit {
            max,
            since: now() - Duration::hours(24),
        }),
    )
    .map(|_| ())
}

fn event_details(title: &str, capacity: Option<i32>) -> EventDetails {
    EventDetails::try_new(
        EventTitle::new(title).unwrap(),
        "Meet at the north gate.".to_string(),
        EventLocation::new("Brands Hatch").unwrap(),
        now() + Duration::days(3),
        None,
        capacity,
    )
    .unwrap()
}

#[test]
fn test_user_lookup_is_case_insensitive() {
    let test_db = common::TestDb::new("test_user_lookup_is_case_insensitive.db");
    let repo = test_db.repo();
    let user = create_user(&repo, "miata_mike");

    let by_name = repo.get_user_by_login("MIATA_MIKE").unwrap();
    let by_email = repo.get_user_by_login("miata_mike@example.com").unwrap();

    assert_eq!(by_name.map(|u| u.id), Some(user.id));
    assert_eq!(by_email.map(|u| u.id), Some(user.id));
}

#[test]
fn test_duplicate_username_is_constraint_violation() {
    let test_db = common::TestDb::new("test_duplicate_username_is_constraint_violation.db");
    let repo = test_db.repo();
    create_user(&repo, "rotary");

    let result = repo.create_user(&NewUser {
        username: Username::new("Rotary").unwrap(),
        email: UserEmail::new("other@example.com").unwrap(),
        password_hash: "not-a-real-hash".to_string(),
        display_name: DisplayName::new("Rotary").unwrap(),
        created_at: now(),
    });
    assert!(matches!(
        result,
        Err(RepositoryError::ConstraintViolation(_))
    ));

    let (total, _) = repo.list_users(UserListQuery::new()).unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_free_inbox_window_hides_older_messages() {
    let test_db = common::TestDb::new("test_free_inbox_window_hides_older_messages.db");
    let repo = test_db.repo();
    let me = create_user(&repo, "reader").id;
    let other = create_user(&repo, "writer").id;

    for minutes_ago in (1..=5).rev() {
        send(&repo, other, me, &format!("message {minutes_ago}"), minutes_ago);
    }

    let listing = repo
        .list_messages(MessageListQuery::new(me, MessageFolder::Inbox).window(3))
        .unwrap();

    assert_eq!(listing.total, 5);
    assert_eq!(listing.visible, 3);
    assert_eq!(listing.messages.len(), 3);
    assert_eq!(listing.messages[0].body.as_str(), "message 1");

    let searched = repo
        .list_messages(
            MessageListQuery::new(me, MessageFolder::Inbox)
                .search("message 5")
                .window(3),
        )
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.visible, 0);
    assert!(searched.messages.is_empty());
}

#[test]
fn test_conversation_limit_counts_only_first_messages() {
    let test_db = common::TestDb::new("test_conversation_limit_counts_only_first_messages.db");
    let repo = test_db.repo();
    let me = create_user(&repo, "starter").id;
    let old_friend = create_user(&repo, "oldfriend").id;
    let new_friend = create_user(&repo, "newfriend").id;
    let admirer = create_user(&repo, "admirer").id;
    let stranger = create_user(&repo, "stranger").id;

    send(&repo, me, old_friend, "long time", 60 * 48);
    send(&repo, me, old_friend, "still there?", 10);
    send(&repo, me, new_friend, "nice car", 5);
    send(&repo, admirer, me, "hi!", 30);
    send(&repo, me, admirer, "hello back", 20);

    // Only the new_friend conversation was started by me today.
    assert!(matches!(
        send_limited(&repo, me, stranger, 1),
        Err(RepositoryError::LimitReached(_))
    ));
    send_limited(&repo, me, old_friend, 1).unwrap();
    send_limited(&repo, me, admirer, 1).unwrap();
    send_limited(&repo, me, stranger, 2).unwrap();

    let sent = repo
        .list_messages(MessageListQuery::new(me, MessageFolder::Sent))
        .unwrap();
    assert_eq!(sent.total, 7);
}

#[test]
fn test_conversation_limit_holds_under_concurrent_sends() {
    let test_db = common::TestDb::new("test_conversation_limit_holds_under_concurrent_sends.db");
    let repo = test_db.repo();
    let sender = create_user(&repo, "eager").id;
    let recipients = (0..8)
        .map(|i| create_user(&repo, &format!("target{i}")).id)
        .collect::<Vec<_>>();

    let results = std::thread::scope(|scope| {
        let handles = recipients
            .iter()
            .map(|&recipient| {
                let repo = repo.clone();
                scope.spawn(move || send_limited(&repo, sender, recipient, 5))
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 5);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| matches!(err, RepositoryError::LimitReached(_)))
    );
}

#[test]
fn test_deleted_messages_leave_only_one_mailbox() {
    let test_db = common::TestDb::new("test_deleted_messages_leave_only_one_mailbox.db");
    let repo = test_db.repo();
    let me = create_user(&repo, "sender").id;
    let other = create_user(&repo, "recipient").id;
    send(&repo, me, other, "oops", 1);

    let sent = repo
        .list_messages(MessageListQuery::new(me, MessageFolder::Sent))
        .unwrap();
    let message = sent.messages[0].clone();
    repo.delete_message_for(message.id, me).unwrap();

    let sent_after = repo
        .list_messages(MessageListQuery::new(me, MessageFolder::Sent))
        .unwrap();
    let inbox = repo
        .list_messages(MessageListQuery::new(other, MessageFolder::Inbox))
        .unwrap();
    assert_eq!(sent_after.total, 0);
    assert_eq!(inbox.total, 1);
    assert_eq!(repo.count_unread(other).unwrap(), 1);

    repo.mark_conversation_read(other, me, now()).unwrap();
    assert_eq!(repo.count_unread(other).unwrap(), 0);
}

#[test]
fn test_rsvp_going_respects_capacity() {
    let test_db = common::TestDb::new("test_rsvp_going_respects_capacity.db");
    let repo = test_db.repo();
    let creator = create_user(&repo, "organiser").id;
    let guest = create_user(&repo, "guest").id;
    let late = create_user(&repo, "latecomer").id;

    let event = repo
        .create_event(&NewEvent {
            creator_id: creator,
            details: event_details("Track day", Some(2)),
            created_at: now(),
        })
        .unwrap();

    repo.upsert_attendee(event.id, guest, RsvpStatus::Going, now())
        .unwrap();
    let full = repo.upsert_attendee(event.id, late, RsvpStatus::Going, now());
    assert!(matches!(full, Err(RepositoryError::ConstraintViolation(_))));

    repo.upsert_attendee(event.id, late, RsvpStatus::Interested, now())
        .unwrap();
    repo.upsert_attendee(event.id, guest, RsvpStatus::Going, now())
        .unwrap();

    let counts = repo.attendee_counts(&[event.id]).unwrap();
    let counts = counts.get(&event.id).copied().unwrap_or_default();
    assert_eq!(counts.going, 2);
    assert_eq!(counts.interested, 1);

    assert!(repo.remove_attendee(event.id, guest).unwrap());
    assert!(!repo.remove_attendee(event.id, guest).unwrap());
    repo.upsert_attendee(event.id, late, RsvpStatus::Going, now())
        .unwrap();

    let going = repo
        .list_attendees(event.id, Some(RsvpStatus::Going))
        .unwrap();
    assert_eq!(going.len(), 2);
}

#[test]
fn test_event_thread_sync_and_close() {
    let test_db = common::TestDb::new("test_event_thread_sync_and_close.db");
    let repo = test_db.repo();
    let creator = create_user(&repo, "cruiser").id;

    let event = repo
        .create_event(&NewEvent {
            creator_id: creator,
            details: event_details("Sunday cruise", None),
            created_at: now(),
        })
        .unwrap();

    let content = EventThreadContent {
        event_id: event.id,
        author_id: creator,
        title: ThreadTitle::new("Sunday cruise").unwrap(),
        body: PostBody::new("When: soon").unwrap(),
        updated_at: now(),
    };
    let created = repo.sync_event_thread(&content).unwrap();
    assert_eq!(created.post_count, 1);

    let renamed = repo
        .sync_event_thread(&EventThreadContent {
            title: ThreadTitle::new("Sunday coastal cruise").unwrap(),
            body: PostBody::new("When: later").unwrap(),
            ..content
        })
        .unwrap();
    assert_eq!(renamed.id, created.id);
    assert_eq!(renamed.title.as_str(), "Sunday coastal cruise");
    assert_eq!(renamed.post_count, 1);

    let (_, posts) = repo.list_posts(created.id, None).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].body.as_str(), "When: later");

    let events_category = repo
        .get_category_by_slug(&Slug::parse("events").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(events_category.id, created.category_id);

    let closed = repo.delete_event(event.id).unwrap().unwrap();

    assert_eq!(closed.id, created.id);
    assert!(closed.is_locked);
    assert!(closed.event_id.is_none());
    assert_eq!(closed.title.as_str(), "[Cancelled] Sunday coastal cruise");
    let stored = repo.get_thread(created.id).unwrap().unwrap();
    assert!(stored.is_locked);
    assert_eq!(stored.title.as_str(), "[Cancelled] Sunday coastal cruise");
    assert!(repo.get_event(event.id).unwrap().is_none());
    assert!(repo.get_thread_by_event(event.id).unwrap().is_none());

    assert!(matches!(
        repo.delete_event(event.id),
        Err(RepositoryError::NotFound)
    ));
    let untouched = repo.get_thread(created.id).unwrap().unwrap();
    assert_eq!(untouched.title.as_str(), "[Cancelled] Sunday coastal cruise");
}

#[test]
fn test_deleting_event_without_thread() {
    let test_db = common::TestDb::new("test_deleting_event_without_thread.db");
    let repo = test_db.repo();
    let creator = create_user(&repo, "quiet_host").id;

    let event = repo
        .create_event(&NewEvent {
            creator_id: creator,
            details: event_details("Garage night", Some(4)),
            created_at: now(),
        })
        .unwrap();

    assert!(repo.delete_event(event.id).unwrap().is_none());
    assert!(repo.get_event(event.id).unwrap().is_none());
    assert!(repo.list_attendees(event.id, None).unwrap().is_empty());
}

#[test]
fn test_forum_post_counters() {
    let test_db = common::TestDb::new("test_forum_post_counters.db");
    let repo = test_db.repo();
    let author = create_user(&repo, "poster").id;
    let replier = create_user(&repo, "replier").id;

    let category = repo
        .create_category(&NewCategory {
            name: CategoryName::new("Track Days & Meets").unwrap(),
            slug: Slug::from_name("Track Days & Meets").unwrap(),
            description: String::new(),
            position: 1,
            created_at: now(),
        })
        .unwrap();
    assert_eq!(category.slug.as_str(), "track-days-meets");

    let duplicate = repo.create_category(&NewCategory {
        name: CategoryName::new("Track Days & Meets").unwrap(),
        slug: Slug::from_name("Track Days & Meets").unwrap(),
        description: String::new(),
        position: 2,
        created_at: now(),
    });
    assert!(matches!(
        duplicate,
        Err(RepositoryError::ConstraintViolation(_))
    ));

    let (thread, first_post) = repo
        .create_thread(&NewThread {
            category_id: category.id,
            author_id: author,
            title: ThreadTitle::new("Tyre pressures").unwrap(),
            body: PostBody::new("What do you run?").unwrap(),
            created_at: now(),
        })
        .unwrap();
    assert_eq!(thread.post_count, 1);

    let reply = repo
        .create_post(&NewPost {
            thread_id: thread.id,
            author_id: replier,
            body: PostBody::new("32 psi hot").unwrap(),
            created_at: now() + Duration::seconds(1),
        })
        .unwrap();

    let bumped = repo.get_thread(thread.id).unwrap().unwrap();
    assert_eq!(bumped.post_count, 2);
    assert!(bumped.last_activity_at > thread.last_activity_at);
    assert_eq!(repo.first_post_id(thread.id).unwrap(), Some(first_post.id));

    repo.delete_post(reply.id).unwrap();
    let after = repo.get_thread(thread.id).unwrap().unwrap();
    assert_eq!(after.post_count, 1);

    let categories = repo.list_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].1, 1);

    repo.delete_thread(thread.id).unwrap();
    assert!(repo.get_post(first_post.id).unwrap().is_none());
}
