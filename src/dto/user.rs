//! Profile payloads.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::UserId;
use crate::domain::user::User;

/// Profile as seen by other members.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublicProfile {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
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
    pub created_at: NaiveDateTime,
    pub last_active_at: NaiveDateTime,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.as_str().to_string(),
            display_name: user.display_name.as_str().to_string(),
            bio: user.bio.clone(),
            location: user.location.clone(),
            age: user.age,
            gender: user.gender.clone(),
            looking_for: user.looking_for.clone(),
            car_make: user.car_make.clone(),
            car_model: user.car_model.clone(),
            car_year: user.car_year,
            interests: user.interests.clone(),
            avatar_url: user.avatar_url.clone(),
            is_premium: user.is_premium,
            created_at: user.created_at,
            last_active_at: user.last_active_at,
        }
    }
}

/// Profile of the signed-in member, including account details.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PrivateProfile {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for PrivateProfile {
    fn from(user: &User) -> Self {
        Self {
            profile: PublicProfile::from(user),
            email: user.email.as_str().to_string(),
            is_admin: user.is_admin,
        }
    }
}

/// Returned by registration and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PrivateProfile,
}

/// Filters accepted by `GET /api/users`.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub car_make: Option<String>,
    pub location: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub search: Option<String>,
    pub page: Option<usize>,
}
