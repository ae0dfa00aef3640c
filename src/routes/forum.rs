use actix_web::{HttpResponse, Responder, delete, get, patch, post, put, web};

use crate::dto::PageQuery;
use crate::forms::forum::{CategoryForm, ModerateThreadForm, PostForm, ThreadForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{error_response, json_or_error};
use crate::services::forum as forum_service;

#[get("/forum/categories")]
pub async fn list_categories(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_or_error(
        "list categories",
        forum_service::list_categories(repo.get_ref()),
    )
}

#[post("/forum/categories")]
pub async fn create_category(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CategoryForm>,
) -> impl Responder {
    match forum_service::create_category(repo.get_ref(), &user, form) {
        Ok(category) => HttpResponse::Created().json(category),
        Err(err) => error_response("create category", err),
    }
}

#[get("/forum/categories/{slug}/threads")]
pub async fn list_threads(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    json_or_error(
        "list threads",
        forum_service::list_threads(repo.get_ref(), &slug, query.into_inner()),
    )
}

#[post("/forum/categories/{slug}/threads")]
pub async fn create_thread(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    slug: web::Path<String>,
    web::Json(form): web::Json<ThreadForm>,
) -> impl Responder {
    match forum_service::create_thread(repo.get_ref(), &user, &slug, form) {
        Ok(created) => HttpResponse::Created().json(created),
        Err(err) => error_response("create thread", err),
    }
}

#[get("/forum/threads/{thread_id}")]
pub async fn get_thread(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    thread_id: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    json_or_error(
        "load thread",
        forum_service::get_thread(repo.get_ref(), thread_id.into_inner(), query.into_inner()),
    )
}

#[delete("/forum/threads/{thread_id}")]
pub async fn delete_thread(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    thread_id: web::Path<i32>,
) -> impl Responder {
    match forum_service::delete_thread(repo.get_ref(), &user, thread_id.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("delete thread", err),
    }
}

#[patch("/forum/threads/{thread_id}")]
pub async fn moderate_thread(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    thread_id: web::Path<i32>,
    web::Json(form): web::Json<ModerateThreadForm>,
) -> impl Responder {
    json_or_error(
        "moderate thread",
        forum_service::moderate_thread(repo.get_ref(), &user, thread_id.into_inner(), form),
    )
}

#[post("/forum/threads/{thread_id}/posts")]
pub async fn create_post(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    thread_id: web::Path<i32>,
    web::Json(form): web::Json<PostForm>,
) -> impl Responder {
    match forum_service::create_post(repo.get_ref(), &user, thread_id.into_inner(), form) {
        Ok(post) => HttpResponse::Created().json(post),
        Err(err) => error_response("create post", err),
    }
}

#[put("/forum/posts/{post_id}")]
pub async fn update_post(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    post_id: web::Path<i32>,
    web::Json(form): web::Json<PostForm>,
) -> impl Responder {
    json_or_error(
        "update post",
        forum_service::update_post(repo.get_ref(), &user, post_id.into_inner(), form),
    )
}

#[delete("/forum/posts/{post_id}")]
pub async fn delete_post(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    post_id: web::Path<i32>,
) -> impl Responder {
    match forum_service::delete_post(repo.get_ref(), &user, post_id.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("delete post", err),
    }
}
