//! Profile editing payload.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{
    Age, AvatarUrl, Bio, CarYear, DisplayName, TypeConstraintError, clean_optional,
};
use crate::domain::user::UpdateProfile;
use crate::forms::{FormError, double_option};

/// Longest accepted value for short profile attributes such as location.
const SHORT_TEXT_MAX_LEN: usize = 100;
const MAX_INTERESTS: usize = 20;
const INTEREST_MAX_LEN: usize = 32;

#[derive(Debug, Default, Deserialize, Validate)]
/// Payload of `PUT /api/users/me`.
///
/// A missing field keeps the stored value; `null` or an empty string clears it.
pub struct UpdateProfileForm {
    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub age: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub looking_for: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub car_make: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub car_model: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub car_year: Option<Option<i32>>,
    pub interests: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

fn short_text(
    field: &'static str,
    value: Option<Option<String>>,
) -> Result<Option<Option<String>>, FormError> {
    value
        .map(|inner| {
            let cleaned = clean_optional(inner.as_deref());
            match cleaned {
                Some(text) if text.chars().count() > SHORT_TEXT_MAX_LEN => Err(FormError::field(
                    field,
                )(
                    TypeConstraintError::TooLong(SHORT_TEXT_MAX_LEN),
                )),
                other => Ok(other),
            }
        })
        .transpose()
}

fn interests(values: Vec<String>) -> Result<Vec<String>, FormError> {
    let mut tags = Vec::new();
    for value in values {
        let Some(tag) = clean_optional(Some(&value)) else {
            continue;
        };
        if tag.chars().count() > INTEREST_MAX_LEN {
            return Err(FormError::field("interests")(TypeConstraintError::TooLong(
                INTEREST_MAX_LEN,
            )));
        }
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_INTERESTS {
        return Err(FormError::field("interests")(TypeConstraintError::InvalidValue(
            format!("at most {MAX_INTERESTS} interests are allowed"),
        )));
    }
    Ok(tags)
}

impl UpdateProfileForm {
    /// Validates the payload and converts it into a partial profile update.
    pub fn into_update(self, current_year: i32) -> Result<UpdateProfile, FormError> {
        self.validate()?;

        let display_name = self
            .display_name
            .map(DisplayName::new)
            .transpose()
            .map_err(FormError::field("display_name"))?;

        let bio = self
            .bio
            .map(|bio| {
                clean_optional(bio.as_deref())
                    .map(Bio::new)
                    .transpose()
                    .map_err(FormError::field("bio"))
            })
            .transpose()?;

        let age = self
            .age
            .map(|age| age.map(Age::new).transpose().map_err(FormError::field("age")))
            .transpose()?;

        let car_year = self
            .car_year
            .map(|year| {
                year.map(|year| CarYear::new(year, current_year))
                    .transpose()
                    .map_err(FormError::field("car_year"))
            })
            .transpose()?;

        let avatar_url = self
            .avatar_url
            .map(|url| {
                url.as_deref()
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(AvatarUrl::new)
                    .transpose()
                    .map_err(FormError::field("avatar_url"))
            })
            .transpose()?;

        Ok(UpdateProfile {
            display_name,
            bio,
            location: short_text("location", self.location)?,
            age,
            gender: short_text("gender", self.gender)?,
            looking_for: short_text("looking_for", self.looking_for)?,
            car_make: short_text("car_make", self.car_make)?,
            car_model: short_text("car_model", self.car_model)?,
            car_year,
            interests: self.interests.map(interests).transpose()?,
            avatar_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_left_untouched() {
        let form: UpdateProfileForm = serde_json::from_str(r#"{"car_make": "Mazda"}"#).unwrap();
        let update = form.into_update(2025).unwrap();
        assert_eq!(update.car_make, Some(Some("Mazda".to_string())));
        assert_eq!(update.location, None);
        assert_eq!(update.bio, None);
    }

    #[test]
    fn null_and_blank_values_clear_fields() {
        let form: UpdateProfileForm =
            serde_json::from_str(r#"{"location": null, "bio": "  ", "age": null}"#).unwrap();
        let update = form.into_update(2025).unwrap();
        assert_eq!(update.location, Some(None));
        assert_eq!(update.bio, Some(None));
        assert_eq!(update.age, Some(None));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let form: UpdateProfileForm = serde_json::from_str(r#"{"car_year": 2031}"#).unwrap();
        assert!(matches!(
            form.into_update(2025),
            Err(FormError::InvalidField { field: "car_year", .. })
        ));

        let form: UpdateProfileForm = serde_json::from_str(r#"{"age": 17}"#).unwrap();
        assert!(form.into_update(2025).is_err());
    }

    #[test]
    fn interests_are_cleaned_and_deduplicated() {
        let form: UpdateProfileForm =
            serde_json::from_str(r#"{"interests": [" drift ", "drift", "", "<b>jdm</b>"]}"#)
                .unwrap();
        let update = form.into_update(2025).unwrap();
        assert_eq!(
            update.interests,
            Some(vec!["drift".to_string(), "<b>jdm</b>".to_string()])
        );
    }
}
