//! Diesel models for direct messages.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::message::{Message as DomainMessage, NewMessage as DomainNewMessage};
use crate::domain::types::{MessageBody, MessageId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::messages)]
pub struct Message {
    pub id: i32,
    pub sender_id: i32,
    pub recipient_id: i32,
    pub body: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
    pub read_at: Option<NaiveDateTime>,
    pub deleted_by_sender: bool,
    pub deleted_by_recipient: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::messages)]
pub struct NewMessage<'a> {
    pub sender_id: i32,
    pub recipient_id: i32,
    pub body: &'a str,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Message> for DomainMessage {
    type Error = TypeConstraintError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::new(message.id)?,
            sender_id: UserId::new(message.sender_id)?,
            recipient_id: UserId::new(message.recipient_id)?,
            body: MessageBody::from_trusted(message.body),
            is_read: message.is_read,
            created_at: message.created_at,
            read_at: message.read_at,
        })
    }
}

impl<'a> From<&'a DomainNewMessage> for NewMessage<'a> {
    fn from(message: &'a DomainNewMessage) -> Self {
        Self {
            sender_id: message.sender_id.get(),
            recipient_id: message.recipient_id.get(),
            body: message.body.as_str(),
            created_at: message.created_at,
        }
    }
}
