//! Business rules shared by the HTTP handlers.
//!
//! Services are generic over the repository traits so they can be exercised
//! with [`crate::repository::mock::MockRepository`] in unit tests.

use thiserror::Error;

use crate::domain::types::{TypeConstraintError, UserId};
use crate::forms::FormError;
use crate::models::auth::{AuthenticatedUser, check_role};
use crate::repository::errors::RepositoryError;

pub mod auth;
pub mod events;
pub mod forum;
pub mod messages;
pub mod profiles;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthorized,

    #[error("access denied")]
    Forbidden,

    #[error("{0}")]
    PremiumRequired(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Form(String),

    #[error("{0}")]
    TypeConstraint(String),

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ConstraintViolation(msg) => ServiceError::Conflict(msg),
            RepositoryError::ValidationError(msg) => ServiceError::TypeConstraint(msg),
            RepositoryError::LimitReached(msg) => ServiceError::PremiumRequired(msg),
            other => ServiceError::Repository(other),
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(err.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

/// Fails with [`ServiceError::Forbidden`] unless the user holds `role`.
pub fn ensure_role(user: &AuthenticatedUser, role: &str) -> ServiceResult<()> {
    if check_role(role, &user.roles) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

/// Identifier of the token holder; malformed subjects are treated as unauthenticated.
pub fn current_user_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    user.user_id().map_err(|_| ServiceError::Unauthorized)
}
