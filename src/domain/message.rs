//! Direct messages exchanged between members.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{MessageBody, MessageId, UserId};
use crate::domain::user::UserSummary;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub body: MessageBody,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub read_at: Option<NaiveDateTime>,
}

impl Message {
    /// The other participant from the point of view of `user_id`.
    pub fn counterparty(&self, user_id: UserId) -> UserId {
        if self.sender_id == user_id {
            self.recipient_id
        } else {
            self.sender_id
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub body: MessageBody,
    pub created_at: NaiveDateTime,
}

/// Latest message of a conversation along with its unread counter.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ConversationSummary {
    pub with: UserSummary,
    pub last_message: Message,
    pub unread_count: usize,
}
