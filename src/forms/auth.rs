//! Registration and login payloads.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{DisplayName, UserEmail, Username};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
/// Payload of `POST /api/auth/register`.
pub struct RegisterForm {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Defaults to the username when omitted.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub display_name: Option<String>,
}

/// Validated registration data; the password is still in clear text.
#[derive(Debug)]
pub struct RegisterPayload {
    pub username: Username,
    pub email: UserEmail,
    pub password: String,
    pub display_name: DisplayName,
}

impl TryFrom<RegisterForm> for RegisterPayload {
    type Error = FormError;

    fn try_from(form: RegisterForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let display_name = form
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(form.username.trim());
        let display_name =
            DisplayName::new(display_name).map_err(FormError::field("display_name"))?;

        Ok(Self {
            username: Username::new(form.username).map_err(|_| FormError::InvalidUsername)?,
            email: UserEmail::new(form.email).map_err(|_| FormError::InvalidEmail)?,
            password: form.password,
            display_name,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
/// Payload of `POST /api/auth/login`; `login` is a username or an email.
pub struct LoginForm {
    #[validate(length(min = 1))]
    pub login: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            display_name: None,
        }
    }

    #[test]
    fn display_name_defaults_to_username() {
        let payload =
            RegisterPayload::try_from(form("Miata_Mike", "mike@example.com", "hunter2hunter2"))
                .unwrap();
        assert_eq!(payload.username.as_str(), "miata_mike");
        assert_eq!(payload.display_name.as_str(), "Miata_Mike");
    }

    #[test]
    fn short_password_is_rejected() {
        let result = RegisterPayload::try_from(form("miata_mike", "mike@example.com", "short"));
        assert!(matches!(result, Err(FormError::Validation(_))));
    }

    #[test]
    fn username_with_spaces_is_rejected() {
        let result =
            RegisterPayload::try_from(form("miata mike", "mike@example.com", "hunter2hunter2"));
        assert!(matches!(result, Err(FormError::InvalidUsername)));
    }
}
