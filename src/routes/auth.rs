use actix_web::{HttpResponse, Responder, get, post, web};

use crate::forms::auth::{LoginForm, RegisterForm};
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, json_or_error};
use crate::services::auth as auth_service;

#[post("/auth/register")]
pub async fn register(
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    web::Json(form): web::Json<RegisterForm>,
) -> impl Responder {
    match auth_service::register(repo.get_ref(), form, &server_config.auth_settings()) {
        Ok(response) => HttpResponse::Created().json(response),
        Err(err) => error_response("register user", err),
    }
}

#[post("/auth/login")]
pub async fn login(
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    web::Json(form): web::Json<LoginForm>,
) -> impl Responder {
    json_or_error(
        "log in",
        auth_service::login(repo.get_ref(), form, &server_config.auth_settings()),
    )
}

#[get("/auth/me")]
pub async fn me(user: AuthenticatedUser, repo: web::Data<DieselRepository>) -> impl Responder {
    json_or_error("load current user", auth_service::me(repo.get_ref(), &user))
}
