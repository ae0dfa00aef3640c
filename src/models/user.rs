//! Diesel models for member accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{DisplayName, TypeConstraintError, UserEmail, UserId, Username};
use crate::domain::user::{
    NewUser as DomainNewUser, UpdateProfile as DomainUpdateProfile, User as DomainUser,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
/// Diesel model for [`crate::domain::user::User`].
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub looking_for: Option<String>,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    pub car_year: Option<i32>,
    pub interests: String, // JSON array of tags
    pub avatar_url: Option<String>,
    pub is_premium: bool,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_active_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
/// Insertable form of [`User`].
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub interests: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_active_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
/// Data used when updating profile columns of a [`User`] record.
pub struct UpdateProfile<'a> {
    pub display_name: Option<&'a str>,
    pub bio: Option<Option<&'a str>>,
    pub location: Option<Option<&'a str>>,
    pub age: Option<Option<i32>>,
    pub gender: Option<Option<&'a str>>,
    pub looking_for: Option<Option<&'a str>>,
    pub car_make: Option<Option<&'a str>>,
    pub car_model: Option<Option<&'a str>>,
    pub car_year: Option<Option<i32>>,
    pub interests: Option<String>,
    pub avatar_url: Option<Option<&'a str>>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        let interests = serde_json::from_str(&user.interests).unwrap_or_default();

        Ok(Self {
            id: UserId::new(user.id)?,
            username: Username::new(user.username)?,
            email: UserEmail::new(user.email)?,
            password_hash: user.password_hash,
            display_name: DisplayName::new(user.display_name)?,
            bio: user.bio,
            location: user.location,
            age: user.age,
            gender: user.gender,
            looking_for: user.looking_for,
            car_make: user.car_make,
            car_model: user.car_model,
            car_year: user.car_year,
            interests,
            avatar_url: user.avatar_url,
            is_premium: user.is_premium,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_active_at: user.last_active_at,
        })
    }
}

impl<'a> From<&'a DomainNewUser> for NewUser<'a> {
    fn from(user: &'a DomainNewUser) -> Self {
        Self {
            username: user.username.as_str(),
            email: user.email.as_str(),
            password_hash: user.password_hash.as_str(),
            display_name: user.display_name.as_str(),
            interests: "[]",
            created_at: user.created_at,
            updated_at: user.created_at,
            last_active_at: user.created_at,
        }
    }
}

impl<'a> UpdateProfile<'a> {
    pub fn from_domain(update: &'a DomainUpdateProfile, updated_at: NaiveDateTime) -> Self {
        fn text<T: AsRef<str>>(value: &Option<Option<T>>) -> Option<Option<&str>> {
            value.as_ref().map(|inner| inner.as_ref().map(AsRef::as_ref))
        }

        Self {
            display_name: update.display_name.as_ref().map(|name| name.as_str()),
            bio: update
                .bio
                .as_ref()
                .map(|inner| inner.as_ref().map(|bio| bio.as_str())),
            location: text(&update.location),
            age: update.age.map(|inner| inner.map(|age| age.get())),
            gender: text(&update.gender),
            looking_for: text(&update.looking_for),
            car_make: text(&update.car_make),
            car_model: text(&update.car_model),
            car_year: update.car_year.map(|inner| inner.map(|year| year.get())),
            interests: update
                .interests
                .as_ref()
                .map(|tags| serde_json::Value::from(tags.clone()).to_string()),
            avatar_url: update
                .avatar_url
                .as_ref()
                .map(|inner| inner.as_ref().map(|url| url.as_str())),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::types::{Age, Bio};

    fn db_user() -> User {
        let now = Utc::now().naive_utc();
        User {
            id: 3,
            username: "rotary_rx7".to_string(),
            email: "rx7@example.com".to_string(),
            password_hash: "hash".to_string(),
            display_name: "Rotary".to_string(),
            bio: None,
            location: Some("Osaka".to_string()),
            age: Some(31),
            gender: None,
            looking_for: None,
            car_make: Some("Mazda".to_string()),
            car_model: Some("RX-7".to_string()),
            car_year: Some(1993),
            interests: r#"["drifting","jdm"]"#.to_string(),
            avatar_url: None,
            is_premium: false,
            is_admin: false,
            created_at: now,
            updated_at: now,
            last_active_at: now,
        }
    }

    #[test]
    fn user_into_domain_parses_interests() {
        let domain = DomainUser::try_from(db_user()).unwrap();
        assert_eq!(domain.id.get(), 3);
        assert_eq!(domain.interests, vec!["drifting", "jdm"]);
        assert_eq!(domain.car_make.as_deref(), Some("Mazda"));
    }

    #[test]
    fn malformed_interests_fall_back_to_empty() {
        let mut user = db_user();
        user.interests = "not json".to_string();
        let domain = DomainUser::try_from(user).unwrap();
        assert!(domain.interests.is_empty());
    }

    #[test]
    fn update_changeset_distinguishes_clear_from_skip() {
        let update = DomainUpdateProfile {
            bio: Some(Some(Bio::new("V8 swaps").unwrap())),
            location: Some(None),
            age: Some(Some(Age::new(40).unwrap())),
            interests: Some(vec!["restomod".to_string()]),
            ..Default::default()
        };
        let changeset = UpdateProfile::from_domain(&update, Utc::now().naive_utc());
        assert_eq!(changeset.bio, Some(Some("V8 swaps")));
        assert_eq!(changeset.location, Some(None));
        assert_eq!(changeset.gender, None);
        assert_eq!(changeset.age, Some(Some(40)));
        assert_eq!(changeset.interests.as_deref(), Some(r#"["restomod"]"#));
        assert!(changeset.display_name.is_none());
    }
}
