//! HTTP handlers for the `/api` scope.
//!
//! Handlers stay thin: they extract the caller and payload, call the matching
//! service and turn [`ServiceError`] into a JSON error response.

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use serde_json::json;

use crate::services::ServiceError;

pub mod auth;
pub mod events;
pub mod forum;
pub mod messages;
pub mod users;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Maps a service failure to its HTTP status.
pub fn error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::PremiumRequired(_) => StatusCode::PAYMENT_REQUIRED,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::TypeConstraint(_) => StatusCode::BAD_REQUEST,
        ServiceError::Repository(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Renders `err` as `{"error": ...}`. Server-side failures are logged and
/// their details withheld from the client.
pub fn error_response(operation: &str, err: ServiceError) -> HttpResponse {
    let status = error_status(&err);
    let message = if status.is_server_error() {
        log::error!("Failed to {operation}: {err}");
        "internal server error".to_string()
    } else {
        log::debug!("{operation} refused: {err}");
        err.to_string()
    };

    HttpResponse::build(status).json(ErrorBody { error: message })
}

/// Serializes `value` as a `200 OK` JSON body, or maps the error.
pub fn json_or_error<T: Serialize>(operation: &str, result: Result<T, ServiceError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(err) => error_response(operation, err),
    }
}

fn bad_request(message: String) -> actix_web::Error {
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(ErrorBody { error: message }),
    )
    .into()
}

/// Malformed JSON bodies answer with the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _| bad_request(err.to_string()))
}

/// Malformed query strings answer with the usual error shape.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _| bad_request(err.to_string()))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;

    #[test]
    fn service_errors_map_to_statuses() {
        assert_eq!(
            error_status(&ServiceError::PremiumRequired("upgrade".into())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            error_status(&ServiceError::Form("bad".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            error_status(&ServiceError::from(RepositoryError::ConstraintViolation(
                "dup".into()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_status(&ServiceError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let response = error_response("test", ServiceError::Internal("secret path".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
