//! Events, RSVPs and the discussion thread mirrored from each event.

use chrono::Utc;

use crate::domain::event::{Event, EventAttendee, EventDetails, NewEvent};
use crate::domain::forum::EventThreadContent;
use crate::domain::types::{EventId, PostBody, ThreadTitle};
use crate::domain::user::UserSummary;
use crate::dto::event::{AttendeeView, AttendeesQuery, EventDetail, EventListItem, EventQuery};
use crate::forms::event::{EventForm, RsvpForm};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    EventListQuery, EventReader, EventWriter, ForumReader, ForumWriter, UserReader,
};
use crate::services::{ServiceError, ServiceResult, current_user_id};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Renders the opening post of an event's discussion thread.
pub fn event_thread_content(event: &Event) -> ServiceResult<EventThreadContent> {
    let mut body = match event.ends_at {
        Some(ends_at) => format!(
            "When: {} to {}\n",
            event.starts_at.format(TIME_FORMAT),
            ends_at.format(TIME_FORMAT)
        ),
        None => format!("When: {}\n", event.starts_at.format(TIME_FORMAT)),
    };
    body.push_str(&format!("Where: {}\n", event.location.as_str()));
    if let Some(capacity) = event.capacity {
        body.push_str(&format!("Capacity: {capacity}\n"));
    }
    if !event.description.is_empty() {
        body.push('\n');
        body.push_str(&event.description);
    }

    Ok(EventThreadContent {
        event_id: event.id,
        author_id: event.creator_id,
        title: ThreadTitle::new(event.title.as_str())?,
        body: PostBody::new(body)?,
        updated_at: event.updated_at,
    })
}

/// Creates or refreshes the event's thread. Failures are logged, not raised,
/// since the event itself is already stored.
fn sync_thread<R>(repo: &R, event: &Event)
where
    R: ForumWriter + ?Sized,
{
    let result = event_thread_content(event)
        .and_then(|content| repo.sync_event_thread(&content).map_err(ServiceError::from));
    match result {
        Ok(thread) => log::info!("Synced thread {} for event {}", thread.id, event.id),
        Err(err) => log::error!("Failed to sync thread for event {}: {err}", event.id),
    }
}

fn parse_event_id(id: i32) -> ServiceResult<EventId> {
    EventId::new(id).map_err(|_| ServiceError::NotFound)
}

fn load_event<R>(repo: &R, id: EventId) -> ServiceResult<Event>
where
    R: EventReader + ?Sized,
{
    repo.get_event(id)?.ok_or(ServiceError::NotFound)
}

/// Only the creator and admins may change an event.
fn ensure_can_manage(user: &AuthenticatedUser, event: &Event) -> ServiceResult<()> {
    if event.creator_id == current_user_id(user)? || user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

fn event_detail<R>(repo: &R, event: Event) -> ServiceResult<EventDetail>
where
    R: EventReader + ForumReader + UserReader + ?Sized,
{
    let attendees = repo
        .attendee_counts(&[event.id])?
        .remove(&event.id)
        .unwrap_or_default();
    let creator = repo
        .get_user_by_id(event.creator_id)?
        .map(|user| UserSummary::from(&user));
    let thread_id = repo.get_thread_by_event(event.id)?.map(|thread| thread.id);

    Ok(EventDetail {
        event,
        creator,
        attendees,
        thread_id,
    })
}

/// Creates an event, RSVPs its creator and opens its discussion thread.
pub fn create_event<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: EventForm,
) -> ServiceResult<EventDetail>
where
    R: EventReader + EventWriter + ForumReader + ForumWriter + UserReader + ?Sized,
{
    let creator_id = current_user_id(user)?;
    let details = EventDetails::try_from(form)?;
    let now = Utc::now().naive_utc();

    if details.starts_at <= now {
        return Err(ServiceError::Form(
            "event must start in the future".to_string(),
        ));
    }

    let event = repo
        .create_event(&NewEvent {
            creator_id,
            details,
            created_at: now,
        })
        .map_err(|err| {
            log::error!("Failed to create event: {err}");
            err
        })?;
    log::info!("User {creator_id} created event {}", event.id);

    sync_thread(repo, &event);

    event_detail(repo, event)
}

/// Paginated events; upcoming ones soonest first, otherwise latest first.
pub fn list_events<R>(repo: &R, query: EventQuery) -> ServiceResult<Paginated<EventListItem>>
where
    R: EventReader + ?Sized,
{
    let page = query.page.unwrap_or(1).max(1);
    let mut list_query = EventListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if query.upcoming.unwrap_or(true) {
        list_query = list_query.upcoming(Utc::now().naive_utc());
    }
    if let Some(search) = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        list_query = list_query.search(search);
    }

    let (total, events) = repo.list_events(list_query)?;
    let ids = events.iter().map(|event| event.id).collect::<Vec<_>>();
    let counts = repo.attendee_counts(&ids)?;

    let items = events
        .into_iter()
        .map(|event| EventListItem {
            going_count: counts.get(&event.id).map_or(0, |c| c.going),
            event,
        })
        .collect();

    Ok(Paginated::new(items, page, total))
}

pub fn get_event<R>(repo: &R, id: i32) -> ServiceResult<EventDetail>
where
    R: EventReader + ForumReader + UserReader + ?Sized,
{
    let event = load_event(repo, parse_event_id(id)?)?;
    event_detail(repo, event)
}

/// Replaces an event's details and refreshes its thread.
pub fn update_event<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: EventForm,
) -> ServiceResult<EventDetail>
where
    R: EventReader + EventWriter + ForumReader + ForumWriter + UserReader + ?Sized,
{
    let event = load_event(repo, parse_event_id(id)?)?;
    ensure_can_manage(user, &event)?;

    let details = EventDetails::try_from(form)?;
    let now = Utc::now().naive_utc();
    if details.starts_at != event.starts_at && details.starts_at <= now {
        return Err(ServiceError::Form(
            "event must start in the future".to_string(),
        ));
    }

    let updated = repo.update_event(event.id, &details, now).map_err(|err| {
        log::error!("Failed to update event {}: {err}", event.id);
        err
    })?;

    sync_thread(repo, &updated);

    event_detail(repo, updated)
}

/// Deletes an event; its thread is kept, locked and marked as cancelled.
pub fn delete_event<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: EventReader + EventWriter + ?Sized,
{
    let event = load_event(repo, parse_event_id(id)?)?;
    ensure_can_manage(user, &event)?;

    let closed = repo.delete_event(event.id)?;
    log::info!("Deleted event {}", event.id);
    if let Some(thread) = closed {
        log::info!("Closed thread {} of cancelled event {}", thread.id, event.id);
    }

    Ok(())
}

/// Records or changes the caller's RSVP.
pub fn rsvp<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: RsvpForm,
) -> ServiceResult<EventAttendee>
where
    R: EventReader + EventWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let event = load_event(repo, parse_event_id(id)?)?;

    let attendee = repo
        .upsert_attendee(event.id, user_id, form.status, Utc::now().naive_utc())
        .map_err(|err| {
            log::warn!("RSVP of user {user_id} to event {} refused: {err}", event.id);
            err
        })?;

    Ok(attendee)
}

/// Withdraws the caller's RSVP; withdrawing twice is not an error.
pub fn cancel_rsvp<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: EventReader + EventWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let event = load_event(repo, parse_event_id(id)?)?;
    repo.remove_attendee(event.id, user_id)?;
    Ok(())
}

pub fn list_attendees<R>(
    repo: &R,
    id: i32,
    query: AttendeesQuery,
) -> ServiceResult<Vec<AttendeeView>>
where
    R: EventReader + ?Sized,
{
    let event = load_event(repo, parse_event_id(id)?)?;

    Ok(repo
        .list_attendees(event.id, query.status)?
        .into_iter()
        .map(|(attendee, user)| AttendeeView {
            user: UserSummary::from(&user),
            status: attendee.status,
            responded_at: attendee.created_at,
        })
        .collect())
}
