//! Diesel models for events and RSVPs.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::event::{
    Event as DomainEvent, EventAttendee as DomainEventAttendee, EventDetails,
    NewEvent as DomainNewEvent,
};
use crate::domain::types::{EventId, EventLocation, EventTitle, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::events)]
pub struct Event {
    pub id: i32,
    pub creator_id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::events)]
pub struct NewEvent<'a> {
    pub creator_id: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::events)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateEvent<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::event_attendees)]
#[diesel(primary_key(event_id, user_id))]
pub struct EventAttendee {
    pub event_id: i32,
    pub user_id: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Event> for DomainEvent {
    type Error = TypeConstraintError;

    fn try_from(event: Event) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EventId::new(event.id)?,
            creator_id: UserId::new(event.creator_id)?,
            title: EventTitle::new(event.title)?,
            description: event.description,
            location: EventLocation::new(event.location)?,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            capacity: event.capacity,
            created_at: event.created_at,
            updated_at: event.updated_at,
        })
    }
}

impl TryFrom<EventAttendee> for DomainEventAttendee {
    type Error = TypeConstraintError;

    fn try_from(attendee: EventAttendee) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: EventId::new(attendee.event_id)?,
            user_id: UserId::new(attendee.user_id)?,
            status: attendee.status.parse()?,
            created_at: attendee.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewEvent> for NewEvent<'a> {
    fn from(event: &'a DomainNewEvent) -> Self {
        Self {
            creator_id: event.creator_id.get(),
            title: event.details.title.as_str(),
            description: event.details.description.as_str(),
            location: event.details.location.as_str(),
            starts_at: event.details.starts_at,
            ends_at: event.details.ends_at,
            capacity: event.details.capacity,
            created_at: event.created_at,
            updated_at: event.created_at,
        }
    }
}

impl<'a> UpdateEvent<'a> {
    pub fn from_details(details: &'a EventDetails, updated_at: NaiveDateTime) -> Self {
        Self {
            title: details.title.as_str(),
            description: details.description.as_str(),
            location: details.location.as_str(),
            starts_at: details.starts_at,
            ends_at: details.ends_at,
            capacity: details.capacity,
            updated_at,
        }
    }
}
