//! Direct message payload.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{MessageBody, UserId};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
/// Payload of `POST /api/messages`.
pub struct SendMessageForm {
    #[validate(range(min = 1))]
    pub recipient_id: i32,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// Validated message ready to be addressed.
#[derive(Debug)]
pub struct SendMessagePayload {
    pub recipient_id: UserId,
    pub body: MessageBody,
}

impl TryFrom<SendMessageForm> for SendMessagePayload {
    type Error = FormError;

    fn try_from(form: SendMessageForm) -> Result<Self, Self::Error> {
        form.validate()?;

        Ok(Self {
            recipient_id: UserId::new(form.recipient_id)
                .map_err(FormError::field("recipient_id"))?,
            body: MessageBody::new(form.body).map_err(FormError::field("body"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_from_body() {
        let payload = SendMessagePayload::try_from(SendMessageForm {
            recipient_id: 2,
            body: "Nice <script>alert(1)</script>build!".to_string(),
        })
        .unwrap();
        assert_eq!(payload.body.as_str(), "Nice build!");
    }

    #[test]
    fn body_that_is_only_markup_is_rejected() {
        let result = SendMessagePayload::try_from(SendMessageForm {
            recipient_id: 2,
            body: "<script></script>".to_string(),
        });
        assert!(matches!(
            result,
            Err(FormError::InvalidField { field: "body", .. })
        ));
    }
}
