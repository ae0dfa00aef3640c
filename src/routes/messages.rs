use actix_web::{HttpResponse, Responder, delete, get, post, web};

use crate::dto::PageQuery;
use crate::dto::message::MessageQuery;
use crate::forms::message::SendMessageForm;
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, json_or_error};
use crate::services::messages as messages_service;

#[get("/messages")]
pub async fn list_messages(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    query: web::Query<MessageQuery>,
) -> impl Responder {
    json_or_error(
        "list messages",
        messages_service::list_messages(
            repo.get_ref(),
            &user,
            query.into_inner(),
            server_config.messaging_policy(),
        ),
    )
}

#[post("/messages")]
pub async fn send_message(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    web::Json(form): web::Json<SendMessageForm>,
) -> impl Responder {
    match messages_service::send_message(
        repo.get_ref(),
        &user,
        form,
        server_config.messaging_policy(),
    ) {
        Ok(message) => HttpResponse::Created().json(message),
        Err(err) => error_response("send message", err),
    }
}

#[get("/messages/unread-count")]
pub async fn unread_count(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_or_error(
        "count unread messages",
        messages_service::unread_count(repo.get_ref(), &user),
    )
}

#[get("/messages/conversations")]
pub async fn list_conversations(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_or_error(
        "list conversations",
        messages_service::list_conversations(repo.get_ref(), &user),
    )
}

#[get("/messages/conversations/{user_id}")]
pub async fn get_conversation(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    other_id: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    json_or_error(
        "load conversation",
        messages_service::get_conversation(
            repo.get_ref(),
            &user,
            other_id.into_inner(),
            query.page,
        ),
    )
}

#[post("/messages/{message_id}/read")]
pub async fn mark_read(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    message_id: web::Path<i32>,
) -> impl Responder {
    json_or_error(
        "mark message read",
        messages_service::mark_read(repo.get_ref(), &user, message_id.into_inner()),
    )
}

#[delete("/messages/{message_id}")]
pub async fn delete_message(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    message_id: web::Path<i32>,
) -> impl Responder {
    match messages_service::delete_message(repo.get_ref(), &user, message_id.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("delete message", err),
    }
}
