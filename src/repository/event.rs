//! Repository implementation for events and RSVPs.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel::upsert::excluded;

use crate::domain::event::{
    AttendeeCounts, Event, EventAttendee, EventDetails, NewEvent, RsvpStatus,
};
use crate::domain::forum::Thread;
use crate::domain::types::{EventId, UserId};
use crate::domain::user::User;
use crate::models::event::{
    Event as DbEvent, EventAttendee as DbEventAttendee, NewEvent as DbNewEvent,
    UpdateEvent as DbUpdateEvent,
};
use crate::models::user::User as DbUser;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::forum::close_event_thread;
use crate::repository::user::like_pattern;
use crate::repository::{DieselRepository, EventListQuery, EventReader, EventWriter};

impl EventReader for DieselRepository {
    fn get_event(&self, id: EventId) -> RepositoryResult<Option<Event>> {
        use crate::schema::events;

        let mut conn = self.conn()?;
        let db_event = events::table
            .find(id.get())
            .first::<DbEvent>(&mut conn)
            .optional()?;

        db_event
            .map(|event| Event::try_from(event).map_err(RepositoryError::from))
            .transpose()
    }

    fn list_events(&self, query: EventListQuery) -> RepositoryResult<(usize, Vec<Event>)> {
        use crate::schema::events;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = events::table.into_boxed::<Sqlite>();

            if let Some(now) = query.starting_after {
                items = items.filter(events::starts_at.ge(now));
            }
            if let Some(search) = &query.search {
                let pattern = like_pattern(search, true);
                items = items.filter(
                    events::title
                        .like(pattern.clone())
                        .escape('\\')
                        .or(events::location.like(pattern).escape('\\')),
                );
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = if query.starting_after.is_some() {
            query_builder().order((events::starts_at.asc(), events::id.asc()))
        } else {
            query_builder().order((events::starts_at.desc(), events::id.desc()))
        };
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let events = items
            .load::<DbEvent>(&mut conn)?
            .into_iter()
            .map(|event| Event::try_from(event).map_err(RepositoryError::from))
            .collect::<RepositoryResult<Vec<Event>>>()?;

        Ok((total, events))
    }

    fn attendee_counts(
        &self,
        ids: &[EventId],
    ) -> RepositoryResult<HashMap<EventId, AttendeeCounts>> {
        use crate::schema::event_attendees;

        let mut counts = ids
            .iter()
            .map(|id| (*id, AttendeeCounts::default()))
            .collect::<HashMap<_, _>>();
        if ids.is_empty() {
            return Ok(counts);
        }

        let mut conn = self.conn()?;
        let raw_ids = ids.iter().map(|id| id.get()).collect::<Vec<i32>>();

        let rows = event_attendees::table
            .filter(event_attendees::event_id.eq_any(raw_ids))
            .group_by((event_attendees::event_id, event_attendees::status))
            .select((
                event_attendees::event_id,
                event_attendees::status,
                count_star(),
            ))
            .load::<(i32, String, i64)>(&mut conn)?;

        for (event_id, status, count) in rows {
            let event_id = EventId::new(event_id)?;
            let status = status.parse::<RsvpStatus>()?;
            counts
                .entry(event_id)
                .or_default()
                .add(status, count as usize);
        }

        Ok(counts)
    }

    fn list_attendees(
        &self,
        id: EventId,
        status: Option<RsvpStatus>,
    ) -> RepositoryResult<Vec<(EventAttendee, User)>> {
        use crate::schema::{event_attendees, users};

        let mut conn = self.conn()?;

        let mut items = event_attendees::table
            .inner_join(users::table)
            .filter(event_attendees::event_id.eq(id.get()))
            .select((DbEventAttendee::as_select(), DbUser::as_select()))
            .into_boxed::<Sqlite>();

        if let Some(status) = status {
            items = items.filter(event_attendees::status.eq(status.as_str()));
        }

        let rows = items
            .order(event_attendees::created_at.asc())
            .load::<(DbEventAttendee, DbUser)>(&mut conn)?;

        rows.into_iter()
            .map(|(attendee, user)| -> RepositoryResult<(EventAttendee, User)> {
                Ok((EventAttendee::try_from(attendee)?, User::try_from(user)?))
            })
            .collect()
    }
}

impl EventWriter for DieselRepository {
    fn create_event(&self, new_event: &NewEvent) -> RepositoryResult<Event> {
        use crate::schema::{event_attendees, events};

        let mut conn = self.conn()?;
        let insertable: DbNewEvent = new_event.into();

        let db_event = conn.transaction::<DbEvent, RepositoryError, _>(|conn| {
            let db_event = diesel::insert_into(events::table)
                .values(&insertable)
                .get_result::<DbEvent>(conn)?;

            diesel::insert_into(event_attendees::table)
                .values(&DbEventAttendee {
                    event_id: db_event.id,
                    user_id: db_event.creator_id,
                    status: RsvpStatus::Going.as_str().to_string(),
                    created_at: new_event.created_at,
                })
                .execute(conn)?;

            Ok(db_event)
        })?;

        Event::try_from(db_event).map_err(RepositoryError::from)
    }

    fn update_event(
        &self,
        id: EventId,
        details: &EventDetails,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Event> {
        use crate::schema::events;

        let mut conn = self.conn()?;
        let changeset = DbUpdateEvent::from_details(details, updated_at);

        let db_event = diesel::update(events::table.find(id.get()))
            .set(&changeset)
            .get_result::<DbEvent>(&mut conn)?;

        Event::try_from(db_event).map_err(RepositoryError::from)
    }

    fn delete_event(&self, id: EventId) -> RepositoryResult<Option<Thread>> {
        use crate::schema::{event_attendees, events};

        let mut conn = self.conn()?;

        conn.transaction::<Option<Thread>, RepositoryError, _>(|conn| {
            let closed = close_event_thread(conn, id)?;
            diesel::delete(event_attendees::table.filter(event_attendees::event_id.eq(id.get())))
                .execute(conn)?;
            let deleted = diesel::delete(events::table.find(id.get())).execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(closed)
        })
    }

    fn upsert_attendee(
        &self,
        id: EventId,
        user_id: UserId,
        status: RsvpStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<EventAttendee> {
        use crate::schema::{event_attendees, events};

        let mut conn = self.conn()?;

        let db_attendee =
            conn.immediate_transaction::<DbEventAttendee, RepositoryError, _>(|conn| {
                let capacity = events::table
                    .find(id.get())
                    .select(events::capacity)
                    .first::<Option<i32>>(conn)?;

                if let (RsvpStatus::Going, Some(capacity)) = (status, capacity) {
                    let going = event_attendees::table
                        .filter(event_attendees::event_id.eq(id.get()))
                        .filter(event_attendees::user_id.ne(user_id.get()))
                        .filter(event_attendees::status.eq(RsvpStatus::Going.as_str()))
                        .count()
                        .get_result::<i64>(conn)?;
                    if going >= i64::from(capacity) {
                        return Err(RepositoryError::ConstraintViolation(
                            "event is full".to_string(),
                        ));
                    }
                }

                let db_attendee = diesel::insert_into(event_attendees::table)
                    .values(&DbEventAttendee {
                        event_id: id.get(),
                        user_id: user_id.get(),
                        status: status.as_str().to_string(),
                        created_at: at,
                    })
                    .on_conflict((event_attendees::event_id, event_attendees::user_id))
                    .do_update()
                    .set(event_attendees::status.eq(excluded(event_attendees::status)))
                    .get_result::<DbEventAttendee>(conn)?;

                Ok(db_attendee)
            })?;

        EventAttendee::try_from(db_attendee).map_err(RepositoryError::from)
    }

    fn remove_attendee(&self, id: EventId, user_id: UserId) -> RepositoryResult<bool> {
        use crate::schema::event_attendees;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            event_attendees::table
                .filter(event_attendees::event_id.eq(id.get()))
                .filter(event_attendees::user_id.eq(user_id.get())),
        )
        .execute(&mut conn)?;

        Ok(deleted > 0)
    }
}
