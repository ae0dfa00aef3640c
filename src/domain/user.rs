//! Member accounts and their car-centric profiles.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    Age, AvatarUrl, Bio, CarYear, DisplayName, UserEmail, UserId, Username,
};

/// A registered member.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: UserEmail,
    pub password_hash: String,
    pub display_name: DisplayName,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub looking_for: Option<String>,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub interests: Vec<String>,
    pub avatar_url: Option<String>,
    pub is_premium: bool,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_active_at: NaiveDateTime,
}

/// Compact author/counterparty view embedded in messages and forum listings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: Username,
    pub display_name: DisplayName,
    pub avatar_url: Option<String>,
    pub is_premium: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            is_premium: user.is_premium,
        }
    }
}

/// Data required to create a member account.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: Username,
    pub email: UserEmail,
    pub password_hash: String,
    pub display_name: DisplayName,
    pub created_at: NaiveDateTime,
}

/// Partial profile update.
///
/// Outer `None` leaves a column untouched, `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateProfile {
    pub display_name: Option<DisplayName>,
    pub bio: Option<Option<Bio>>,
    pub location: Option<Option<String>>,
    pub age: Option<Option<Age>>,
    pub gender: Option<Option<String>>,
    pub looking_for: Option<Option<String>>,
    pub car_make: Option<Option<String>>,
    pub car_model: Option<Option<String>>,
    pub car_year: Option<Option<CarYear>>,
    pub interests: Option<Vec<String>>,
    pub avatar_url: Option<Option<AvatarUrl>>,
}

impl UpdateProfile {
    /// Returns `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
