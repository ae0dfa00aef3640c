//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (e.g., positive identifiers,
//! normalized/validated email, sanitized free text) so that once a value
//! reaches the domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{ValidateEmail, ValidateUrl};

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided username contains unsupported characters or has a bad length.
    #[error("username must be 3-32 characters of letters, digits or underscore")]
    InvalidUsername,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided string exceeded the allowed length.
    #[error("value is longer than {0} characters")]
    TooLong(usize),
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Provided url failed format validation.
    #[error("invalid url address")]
    InvalidUrl,
}

/// Normalizes and validates an email string.
fn normalize_email<S: Into<String>>(email: S) -> Result<String, TypeConstraintError> {
    let normalized = email.into().trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(TypeConstraintError::InvalidEmail)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(UserId, "Unique identifier for a registered user.");
id_newtype!(MessageId, "Unique identifier for a direct message.");
id_newtype!(EventId, "Unique identifier for a meet-up event.");
id_newtype!(CategoryId, "Unique identifier for a forum category.");
id_newtype!(ThreadId, "Unique identifier for a forum thread.");
id_newtype!(PostId, "Unique identifier for a forum post.");

/// Lower-cased and validated email address.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserEmail(String);

impl UserEmail {
    /// Validates and normalizes an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_email(email)?;
        Ok(Self(normalized))
    }

    /// Borrow the email as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the owned inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for UserEmail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserEmail {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UserEmail {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserEmail> for String {
    fn from(value: UserEmail) -> Self {
        value.0
    }
}

/// Lower-cased login handle made of ASCII letters, digits and underscores.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Trims, lower-cases and validates the handle.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let normalized = value.into().trim().to_lowercase();
        let valid_len = (3..=32).contains(&normalized.len());
        let valid_chars = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid_len && valid_chars {
            Ok(Self(normalized))
        } else {
            Err(TypeConstraintError::InvalidUsername)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $max:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Maximum number of characters accepted.
            pub const MAX_LEN: usize = $max;

            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?.into_inner();
                if inner.chars().count() > Self::MAX_LEN {
                    return Err(TypeConstraintError::TooLong(Self::MAX_LEN));
                }
                Ok(Self(inner))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(DisplayName, 64, "Public name shown on a profile.");
non_empty_string_newtype!(EventTitle, 120, "Event title wrapper enforcing non-empty values.");
non_empty_string_newtype!(
    EventLocation,
    200,
    "Event venue wrapper enforcing non-empty values."
);
non_empty_string_newtype!(
    CategoryName,
    64,
    "Forum category label enforcing trimmed, non-empty values."
);
non_empty_string_newtype!(
    ThreadTitle,
    160,
    "Forum thread title enforcing trimmed, non-empty values."
);

/// Macro for user supplied free text that is cleaned of markup before storage.
macro_rules! sanitized_text_newtype {
    ($name:ident, $max:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Maximum number of characters the member may submit.
            ///
            /// Counted on the trimmed input, so entity escaping done by the
            /// sanitizer never pushes valid text over the limit.
            pub const MAX_LEN: usize = $max;

            /// Constructs a sanitized, trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let value = value.into();
                if value.trim().chars().count() > Self::MAX_LEN {
                    return Err(TypeConstraintError::TooLong(Self::MAX_LEN));
                }
                let sanitized = ammonia::clean(&value);
                Ok(Self(NonEmptyString::new(sanitized)?.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

sanitized_text_newtype!(MessageBody, 2000, "Direct message text.");
sanitized_text_newtype!(PostBody, 10000, "Forum post text.");
sanitized_text_newtype!(Bio, 1000, "Free-form profile description.");

impl MessageBody {
    /// Wraps a body loaded from storage, where it was sanitized on write.
    pub(crate) fn from_trusted(value: String) -> Self {
        Self(value)
    }
}

impl PostBody {
    /// Wraps a body loaded from storage, where it was sanitized on write.
    pub(crate) fn from_trusted(value: String) -> Self {
        Self(value)
    }
}

/// URL-safe category identifier derived from its name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Lower-cases ASCII letters and digits and collapses everything else
    /// into single dashes, trimming dashes at both ends.
    pub fn from_name(name: &str) -> Result<Self, TypeConstraintError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        if slug.is_empty() {
            return Err(TypeConstraintError::InvalidValue(format!(
                "cannot derive slug from {name:?}"
            )));
        }
        Ok(Self(slug))
    }

    /// Accepts an already formatted slug such as one taken from a URL path.
    pub fn parse(value: &str) -> Result<Self, TypeConstraintError> {
        let slug = Self::from_name(value)?;
        if slug.0 == value {
            Ok(slug)
        } else {
            Err(TypeConstraintError::InvalidValue(format!("invalid slug {value:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Non-empty, trimmed avatar URL.
pub struct AvatarUrl(String);

impl AvatarUrl {
    /// Ensures a trimmed URL is non-empty and well formed before wrapping.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let url = NonEmptyString::new(value)?;

        if !url.as_str().validate_url() {
            Err(TypeConstraintError::InvalidUrl)
        } else {
            Ok(Self(url.into_inner()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for AvatarUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Age of an adult member.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Age(i32);

impl Age {
    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        if (18..=120).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::InvalidValue(format!(
                "age must be between 18 and 120, got {value}"
            )))
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Model year of a car; the first automobile dates from 1886.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarYear(i32);

impl CarYear {
    /// Validates the year against `1886..=current_year + 1`.
    pub fn new(value: i32, current_year: i32) -> Result<Self, TypeConstraintError> {
        if (1886..=current_year + 1).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::InvalidValue(format!(
                "car year {value} is out of range"
            )))
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

/// Cleans an optional free text value: markup removed, blank becomes `None`.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(|s| ammonia::clean(s).trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_rejects_non_positive_values() {
        assert_eq!(UserId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(EventId::new(-4), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(ThreadId::new(7).map(ThreadId::get), Ok(7));
    }

    #[test]
    fn email_is_normalized() {
        let email = UserEmail::new("  Driver@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "driver@example.com");
        assert!(UserEmail::new("not-an-email").is_err());
    }

    #[test]
    fn username_is_lowercased_and_validated() {
        assert_eq!(Username::new(" Turbo_Fan ").unwrap().as_str(), "turbo_fan");
        assert_eq!(
            Username::new("ab"),
            Err(TypeConstraintError::InvalidUsername)
        );
        assert_eq!(
            Username::new("drift king"),
            Err(TypeConstraintError::InvalidUsername)
        );
    }

    #[test]
    fn slug_collapses_separators() {
        let slug = Slug::from_name("Track Days & Meets").unwrap();
        assert_eq!(slug.as_str(), "track-days-meets");
        assert_eq!(Slug::from_name("  --JDM-- ").unwrap().as_str(), "jdm");
        assert!(Slug::from_name("&&&").is_err());
    }

    #[test]
    fn slug_parse_requires_canonical_form() {
        assert!(Slug::parse("events").is_ok());
        assert!(Slug::parse("Events").is_err());
        assert!(Slug::parse("track--days").is_err());
    }

    #[test]
    fn sanitized_text_strips_markup() {
        let body = MessageBody::new("hi <script>alert(1)</script><b>there</b>").unwrap();
        assert_eq!(body.as_str(), "hi <b>there</b>");
        assert_eq!(
            MessageBody::new("<script>x</script>"),
            Err(TypeConstraintError::EmptyString)
        );
    }

    #[test]
    fn escaped_entities_do_not_count_against_the_limit() {
        let ampersands = MessageBody::new("&".repeat(600)).unwrap();
        assert!(ampersands.as_str().chars().count() > MessageBody::MAX_LEN);

        let at_limit = "a & b".repeat(MessageBody::MAX_LEN / 5);
        assert_eq!(at_limit.chars().count(), MessageBody::MAX_LEN);
        assert!(MessageBody::new(at_limit.clone()).is_ok());

        assert_eq!(
            MessageBody::new(format!("{at_limit}!")),
            Err(TypeConstraintError::TooLong(MessageBody::MAX_LEN))
        );
        assert!(MessageBody::new(format!("  {at_limit}  ")).is_ok());
    }

    #[test]
    fn text_length_is_bounded() {
        let long = "a".repeat(EventTitle::MAX_LEN + 1);
        assert_eq!(
            EventTitle::new(long),
            Err(TypeConstraintError::TooLong(EventTitle::MAX_LEN))
        );
    }

    #[test]
    fn age_and_car_year_ranges() {
        assert!(Age::new(17).is_err());
        assert_eq!(Age::new(30).unwrap().get(), 30);
        assert!(CarYear::new(1885, 2026).is_err());
        assert!(CarYear::new(2027, 2026).is_ok());
        assert!(CarYear::new(2028, 2026).is_err());
    }

    #[test]
    fn clean_optional_drops_blank_values() {
        assert_eq!(clean_optional(Some("   ")), None);
        assert_eq!(clean_optional(Some(" Berlin ")), Some("Berlin".to_string()));
        assert_eq!(clean_optional(None), None);
    }
}
