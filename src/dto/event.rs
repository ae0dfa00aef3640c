//! Event listing and detail payloads.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::event::{AttendeeCounts, Event, RsvpStatus};
use crate::domain::types::ThreadId;
use crate::domain::user::UserSummary;

/// Filters accepted by `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    /// Defaults to `true`.
    pub upcoming: Option<bool>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EventListItem {
    #[serde(flatten)]
    pub event: Event,
    pub going_count: usize,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub creator: Option<UserSummary>,
    pub attendees: AttendeeCounts,
    pub thread_id: Option<ThreadId>,
}

/// Filter accepted by `GET /api/events/{id}/attendees`.
#[derive(Debug, Default, Deserialize)]
pub struct AttendeesQuery {
    pub status: Option<RsvpStatus>,
}

#[derive(Debug, Serialize)]
pub struct AttendeeView {
    pub user: UserSummary,
    pub status: RsvpStatus,
    pub responded_at: NaiveDateTime,
}
