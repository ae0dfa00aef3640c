//! Domain aggregates exposed by the CarMatch service layer.

pub mod event;
pub mod forum;
pub mod message;
pub mod types;
pub mod user;
