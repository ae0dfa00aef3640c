//! Meet-ups, track days and cruises organised by members.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{EventId, EventLocation, EventTitle, TypeConstraintError, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub creator_id: UserId,
    pub title: EventTitle,
    pub description: String,
    pub location: EventLocation,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Validated event fields shared by creation and update.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDetails {
    pub title: EventTitle,
    pub description: String,
    pub location: EventLocation,
    pub starts_at: NaiveDateTime,
    pub ends_at: Option<NaiveDateTime>,
    pub capacity: Option<i32>,
}

impl EventDetails {
    /// Checks the relations between fields that single values cannot express.
    pub fn try_new(
        title: EventTitle,
        description: String,
        location: EventLocation,
        starts_at: NaiveDateTime,
        ends_at: Option<NaiveDateTime>,
        capacity: Option<i32>,
    ) -> Result<Self, TypeConstraintError> {
        if let Some(ends_at) = ends_at
            && ends_at <= starts_at
        {
            return Err(TypeConstraintError::InvalidValue(
                "event must end after it starts".to_string(),
            ));
        }
        if let Some(capacity) = capacity
            && capacity <= 0
        {
            return Err(TypeConstraintError::InvalidValue(
                "capacity must be positive".to_string(),
            ));
        }
        Ok(Self {
            title,
            description,
            location,
            starts_at,
            ends_at,
            capacity,
        })
    }
}

#[derive(Clone, Debug)]
pub struct NewEvent {
    pub creator_id: UserId,
    pub details: EventDetails,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Interested,
    NotGoing,
}

impl RsvpStatus {
    pub const ALL: [RsvpStatus; 3] = [Self::Going, Self::Interested, Self::NotGoing];

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Going => "going",
            RsvpStatus::Interested => "interested",
            RsvpStatus::NotGoing => "not_going",
        }
    }
}

impl Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RsvpStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "going" => Ok(RsvpStatus::Going),
            "interested" => Ok(RsvpStatus::Interested),
            "not_going" => Ok(RsvpStatus::NotGoing),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown rsvp status {other:?}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventAttendee {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: RsvpStatus,
    pub created_at: NaiveDateTime,
}

/// Number of attendees per RSVP status.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct AttendeeCounts {
    pub going: usize,
    pub interested: usize,
    pub not_going: usize,
}

impl AttendeeCounts {
    pub fn add(&mut self, status: RsvpStatus, count: usize) {
        match status {
            RsvpStatus::Going => self.going += count,
            RsvpStatus::Interested => self.interested += count,
            RsvpStatus::NotGoing => self.not_going += count,
        }
    }
}
