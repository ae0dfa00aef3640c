//! DTO modules shaping service results into API payloads.

use serde::Deserialize;

pub mod event;
pub mod forum;
pub mod message;
pub mod user;

/// Query string carrying only a page number.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}
