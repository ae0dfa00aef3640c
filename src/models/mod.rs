//! Database models and configuration shared across the CarMatch service.

pub mod auth;
pub mod config;
pub mod event;
pub mod forum;
pub mod message;
pub mod user;
