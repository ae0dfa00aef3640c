//! Bearer token claims and helpers for issuing and validating them.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::types::{TypeConstraintError, UserId};
use crate::domain::user::User;

/// Role granted to every registered member.
pub const MEMBER_ROLE: &str = "member";
/// Role granted to forum and event moderators.
pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by the JWT issued at login and registration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Stringified user id.
    pub sub: String,
    pub username: String,
    pub name: String,
    pub roles: Vec<String>,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

impl AuthenticatedUser {
    /// Builds claims for `user` that expire after `ttl_hours`.
    pub fn for_user(user: &User, ttl_hours: i64) -> Self {
        let mut roles = vec![MEMBER_ROLE.to_string()];
        if user.is_admin {
            roles.push(ADMIN_ROLE.to_string());
        }
        Self {
            sub: user.id.to_string(),
            username: user.username.as_str().to_string(),
            name: user.display_name.as_str().to_string(),
            roles,
            exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
        }
    }

    /// Parses the subject claim back into a [`UserId`].
    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        let raw = self
            .sub
            .parse::<i32>()
            .map_err(|_| TypeConstraintError::NonPositiveId)?;
        UserId::new(raw)
    }

    pub fn is_admin(&self) -> bool {
        check_role(ADMIN_ROLE, &self.roles)
    }
}

/// Returns `true` when `role` is present in `roles`.
pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|r| r == role)
}

/// Signs the claims with the shared secret using HS256.
pub fn issue_token(
    claims: &AuthenticatedUser,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verifies signature and expiry of a token and returns its claims.
pub fn decode_token(
    token: &str,
    secret: &str,
) -> Result<AuthenticatedUser, jsonwebtoken::errors::Error> {
    let data = decode::<AuthenticatedUser>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

#[cfg(feature = "server")]
mod extractor {
    use std::future::{Ready, ready};

    use actix_web::dev::Payload;
    use actix_web::error::{ErrorInternalServerError, InternalError};
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{FromRequest, HttpRequest, HttpResponse, web};
    use serde_json::json;

    use super::{AuthenticatedUser, decode_token};
    use crate::models::config::ServerConfig;

    const UNAUTHORIZED: &str = "authentication required";

    fn unauthorized() -> actix_web::Error {
        InternalError::from_response(
            UNAUTHORIZED,
            HttpResponse::Unauthorized().json(json!({ "error": UNAUTHORIZED })),
        )
        .into()
    }

    fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, actix_web::Error> {
        let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
            log::error!("ServerConfig is not registered as app data");
            return Err(ErrorInternalServerError("server misconfigured"));
        };

        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(unauthorized)?;

        decode_token(token, &config.secret).map_err(|err| {
            log::warn!("Rejected bearer token: {err}");
            unauthorized()
        })
    }

    /// Extracts the caller from an `Authorization: Bearer <jwt>` header.
    impl FromRequest for AuthenticatedUser {
        type Error = actix_web::Error;
        type Future = Ready<Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
            ready(authenticate(req))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp: i64) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "7".to_string(),
            username: "boxer_flat6".to_string(),
            name: "Boxer".to_string(),
            roles: vec![MEMBER_ROLE.to_string()],
            exp,
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let original = claims((Utc::now() + Duration::hours(1)).timestamp());
        let token = issue_token(&original, "secret").unwrap();
        let decoded = decode_token(&token, "secret").unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.user_id().unwrap().get(), 7);
        assert!(!decoded.is_admin());
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = issue_token(
            &claims((Utc::now() + Duration::hours(1)).timestamp()),
            "secret",
        )
        .unwrap();
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(
            &claims((Utc::now() - Duration::hours(2)).timestamp()),
            "secret",
        )
        .unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }

    #[test]
    fn check_role_matches_exactly() {
        let roles = vec!["member".to_string(), "admin".to_string()];
        assert!(check_role("admin", &roles));
        assert!(!check_role("adm", &roles));
    }
}
