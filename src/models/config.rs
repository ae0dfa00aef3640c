//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub secret: String,
    pub token_ttl_hours: i64,
    pub static_dir: String,
    pub bcrypt_cost: u32,
    pub free_daily_conversations: usize,
    pub free_inbox_limit: usize,
}

impl ServerConfig {
    /// Token and password hashing settings.
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            secret: self.secret.clone(),
            token_ttl_hours: self.token_ttl_hours,
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    /// Messaging limits for free members.
    pub fn messaging_policy(&self) -> MessagingPolicy {
        MessagingPolicy {
            free_daily_conversations: self.free_daily_conversations,
            free_inbox_limit: self.free_inbox_limit,
        }
    }
}

/// Limits applied to members without a premium subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessagingPolicy {
    /// New conversations a free member may start in a rolling 24 hours.
    pub free_daily_conversations: usize,
    /// Newest inbox messages a free member can see.
    pub free_inbox_limit: usize,
}

impl Default for MessagingPolicy {
    fn default() -> Self {
        Self {
            free_daily_conversations: 5,
            free_inbox_limit: 20,
        }
    }
}

/// Settings used to hash passwords and sign bearer tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthSettings {
    pub secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}
