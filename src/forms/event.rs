//! Event and RSVP payloads.

use chrono::NaiveDateTime;
use serde::Deserialize;
use validator::Validate;

use crate::domain::event::{EventDetails, RsvpStatus};
use crate::domain::types::{EventLocation, EventTitle, TypeConstraintError, clean_optional};
use crate::forms::FormError;

const DESCRIPTION_MAX_LEN: usize = 5000;

#[derive(Debug, Deserialize, Validate)]
/// Payload of `POST /api/events` and `PUT /api/events/{id}`.
///
/// Times are UTC in `YYYY-MM-DDTHH:MM:SS` form.
pub struct EventForm {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub starts_at: NaiveDateTime,
    #[serde(default)]
    pub ends_at: Option<NaiveDateTime>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

impl TryFrom<EventForm> for EventDetails {
    type Error = FormError;

    fn try_from(form: EventForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let description = clean_optional(form.description.as_deref()).unwrap_or_default();
        if description.chars().count() > DESCRIPTION_MAX_LEN {
            return Err(FormError::InvalidField {
                field: "description",
                source: TypeConstraintError::TooLong(DESCRIPTION_MAX_LEN),
            });
        }

        EventDetails::try_new(
            EventTitle::new(form.title).map_err(FormError::field("title"))?,
            description,
            EventLocation::new(form.location).map_err(FormError::field("location"))?,
            form.starts_at,
            form.ends_at,
            form.capacity,
        )
        .map_err(FormError::field("ends_at"))
    }
}

#[derive(Debug, Deserialize)]
/// Payload of `POST /api/events/{id}/rsvp`.
pub struct RsvpForm {
    pub status: RsvpStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(json: &str) -> EventForm {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn valid_form_becomes_details() {
        let details = EventDetails::try_from(form(
            r#"{"title": "Cars & Coffee", "location": "Harbour car park",
                "starts_at": "2030-05-04T09:00:00", "capacity": 40,
                "description": "Bring <b>coffee</b><script>x</script>"}"#,
        ))
        .unwrap();
        assert_eq!(details.title.as_str(), "Cars & Coffee");
        assert_eq!(details.capacity, Some(40));
        assert_eq!(details.description, "Bring <b>coffee</b>");
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = EventDetails::try_from(form(
            r#"{"title": "Night run", "location": "Ring road",
                "starts_at": "2030-05-04T21:00:00", "ends_at": "2030-05-04T20:00:00"}"#,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = EventDetails::try_from(form(
            r#"{"title": "Track day", "location": "Circuit",
                "starts_at": "2030-05-04T09:00:00", "capacity": 0}"#,
        ));
        assert!(matches!(result, Err(FormError::Validation(_))));
    }

    #[test]
    fn rsvp_status_uses_snake_case() {
        let form: RsvpForm = serde_json::from_str(r#"{"status": "not_going"}"#).unwrap();
        assert_eq!(form.status, RsvpStatus::NotGoing);
    }
}
