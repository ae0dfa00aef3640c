//! Inbox and conversation payloads.

use serde::{Deserialize, Serialize};

use crate::domain::message::Message;
use crate::domain::user::UserSummary;
use crate::pagination::Paginated;
use crate::repository::{MessageFolder, MessageSort};

/// Filters accepted by `GET /api/messages`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub folder: Option<MessageFolder>,
    pub unread: Option<bool>,
    /// Counterparty id.
    pub from: Option<i32>,
    pub search: Option<String>,
    pub sort: Option<MessageSort>,
    pub page: Option<usize>,
}

/// A message together with the other participant.
#[derive(Debug, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub counterparty: Option<UserSummary>,
}

/// One page of a mailbox folder.
///
/// `hidden_count` is the number of matching messages withheld from a free
/// member; `upgrade_required` is set whenever it is non-zero.
#[derive(Debug, Serialize)]
pub struct MessagePage {
    #[serde(flatten)]
    pub messages: Paginated<MessageView>,
    pub hidden_count: usize,
    pub upgrade_required: bool,
}

/// Messages exchanged with one member, oldest first.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub with: UserSummary,
    pub messages: Paginated<Message>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: usize,
}
