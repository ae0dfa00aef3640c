//! Registration, login and the current-user lookup.

use chrono::Utc;
use validator::Validate;

use crate::domain::user::{NewUser, User};
use crate::dto::user::{AuthResponse, PrivateProfile};
use crate::forms::FormError;
use crate::forms::auth::{LoginForm, RegisterForm, RegisterPayload};
use crate::models::auth::{AuthenticatedUser, issue_token};
use crate::models::config::AuthSettings;
use crate::repository::{UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult, current_user_id};

/// Signs a token for `user` and pairs it with the private profile.
fn auth_response(user: &User, settings: &AuthSettings) -> ServiceResult<AuthResponse> {
    let claims = AuthenticatedUser::for_user(user, settings.token_ttl_hours);
    let token = issue_token(&claims, &settings.secret).map_err(|err| {
        log::error!("Failed to sign token: {err}");
        ServiceError::Internal(err.to_string())
    })?;

    Ok(AuthResponse {
        token,
        user: PrivateProfile::from(user),
    })
}

/// Creates a member account and signs the caller in.
pub fn register<R>(
    repo: &R,
    form: RegisterForm,
    settings: &AuthSettings,
) -> ServiceResult<AuthResponse>
where
    R: UserReader + UserWriter + ?Sized,
{
    let payload = RegisterPayload::try_from(form)?;

    if repo.get_user_by_login(payload.username.as_str())?.is_some() {
        return Err(ServiceError::Conflict(
            "username is already taken".to_string(),
        ));
    }
    if repo.get_user_by_login(payload.email.as_str())?.is_some() {
        return Err(ServiceError::Conflict(
            "email is already registered".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&payload.password, settings.bcrypt_cost).map_err(|err| {
        log::error!("Failed to hash password: {err}");
        ServiceError::Internal(err.to_string())
    })?;

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
        display_name: payload.display_name,
        created_at: Utc::now().naive_utc(),
    };

    let user = repo.create_user(&new_user).map_err(|err| {
        log::error!("Failed to create user: {err}");
        err
    })?;

    log::info!("Registered user {} ({})", user.username, user.id);

    auth_response(&user, settings)
}

/// Verifies credentials. Unknown logins and wrong passwords fail identically.
pub fn login<R>(repo: &R, form: LoginForm, settings: &AuthSettings) -> ServiceResult<AuthResponse>
where
    R: UserReader + UserWriter + ?Sized,
{
    form.validate().map_err(FormError::from)?;

    let Some(user) = repo.get_user_by_login(&form.login)? else {
        log::warn!("Login attempt for unknown account");
        return Err(ServiceError::Unauthorized);
    };

    if !bcrypt::verify(&form.password, &user.password_hash).unwrap_or(false) {
        log::warn!("Wrong password for user {}", user.id);
        return Err(ServiceError::Unauthorized);
    }

    repo.touch_last_active(user.id, Utc::now().naive_utc())?;

    auth_response(&user, settings)
}

/// Full profile of the token holder.
pub fn me<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<PrivateProfile>
where
    R: UserReader + ?Sized,
{
    let user_id = current_user_id(user)?;
    let user = repo
        .get_user_by_id(user_id)?
        .ok_or(ServiceError::Unauthorized)?;

    Ok(PrivateProfile::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::decode_token;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support;

    fn settings() -> AuthSettings {
        AuthSettings {
            secret: "test-secret".to_string(),
            token_ttl_hours: 1,
            bcrypt_cost: 4,
        }
    }

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "gt86_girl".to_string(),
            email: "gt86@example.com".to_string(),
            password: "boxerengine".to_string(),
            display_name: Some("GT86 Girl".to_string()),
        }
    }

    #[test]
    fn register_hashes_password_and_issues_token() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_login().times(2).returning(|_| Ok(None));
        repo.expect_create_user()
            .withf(|new_user| {
                new_user.username.as_str() == "gt86_girl"
                    && new_user.password_hash != "boxerengine"
                    && bcrypt::verify("boxerengine", &new_user.password_hash).unwrap()
            })
            .times(1)
            .returning(|new_user| {
                let mut user = test_support::user(5, false);
                user.username = new_user.username.clone();
                user.email = new_user.email.clone();
                user.password_hash = new_user.password_hash.clone();
                Ok(user)
            });

        let response = register(&repo, register_form(), &settings()).unwrap();

        let claims = decode_token(&response.token, "test-secret").unwrap();
        assert_eq!(claims.sub, "5");
        assert_eq!(response.user.email, "gt86@example.com");
    }

    #[test]
    fn register_rejects_taken_username() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_login()
            .withf(|login| login == "gt86_girl")
            .returning(|_| Ok(Some(test_support::user(1, false))));
        repo.expect_create_user().times(0);

        let result = register(&repo, register_form(), &settings());

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn login_failures_are_indistinguishable() {
        let mut user = test_support::user(3, false);
        user.password_hash = bcrypt::hash("correct horse", 4).unwrap();

        let mut repo = MockRepository::new();
        repo.expect_get_user_by_login().returning(move |login| {
            if login == "driver3" {
                Ok(Some(user.clone()))
            } else {
                Ok(None)
            }
        });
        repo.expect_touch_last_active().times(0);

        let wrong_password = login(
            &repo,
            LoginForm {
                login: "driver3".to_string(),
                password: "battery staple".to_string(),
            },
            &settings(),
        );
        let unknown_user = login(
            &repo,
            LoginForm {
                login: "nobody".to_string(),
                password: "battery staple".to_string(),
            },
            &settings(),
        );

        let (Err(first), Err(second)) = (wrong_password, unknown_user) else {
            panic!("both logins should fail");
        };
        assert!(matches!(first, ServiceError::Unauthorized));
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn login_touches_last_active() {
        let mut user = test_support::user(3, true);
        user.password_hash = bcrypt::hash("correct horse", 4).unwrap();

        let mut repo = MockRepository::new();
        repo.expect_get_user_by_login()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_touch_last_active()
            .withf(|id, _| id.get() == 3)
            .times(1)
            .returning(|_, _| Ok(()));

        let response = login(
            &repo,
            LoginForm {
                login: "driver3@example.com".to_string(),
                password: "correct horse".to_string(),
            },
            &settings(),
        )
        .unwrap();

        assert!(response.user.profile.is_premium);
    }
}
