use actix_web::{HttpResponse, Responder, delete, get, post, put, web};

use crate::dto::event::{AttendeesQuery, EventQuery};
use crate::forms::event::{EventForm, RsvpForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{error_response, json_or_error};
use crate::services::events as events_service;

#[get("/events")]
pub async fn list_events(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    query: web::Query<EventQuery>,
) -> impl Responder {
    json_or_error(
        "list events",
        events_service::list_events(repo.get_ref(), query.into_inner()),
    )
}

#[post("/events")]
pub async fn create_event(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<EventForm>,
) -> impl Responder {
    match events_service::create_event(repo.get_ref(), &user, form) {
        Ok(event) => HttpResponse::Created().json(event),
        Err(err) => error_response("create event", err),
    }
}

#[get("/events/{event_id}")]
pub async fn get_event(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
) -> impl Responder {
    json_or_error(
        "load event",
        events_service::get_event(repo.get_ref(), event_id.into_inner()),
    )
}

#[put("/events/{event_id}")]
pub async fn update_event(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
    web::Json(form): web::Json<EventForm>,
) -> impl Responder {
    json_or_error(
        "update event",
        events_service::update_event(repo.get_ref(), &user, event_id.into_inner(), form),
    )
}

#[delete("/events/{event_id}")]
pub async fn delete_event(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
) -> impl Responder {
    match events_service::delete_event(repo.get_ref(), &user, event_id.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("delete event", err),
    }
}

#[post("/events/{event_id}/rsvp")]
pub async fn rsvp(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
    web::Json(form): web::Json<RsvpForm>,
) -> impl Responder {
    json_or_error(
        "rsvp to event",
        events_service::rsvp(repo.get_ref(), &user, event_id.into_inner(), form),
    )
}

#[delete("/events/{event_id}/rsvp")]
pub async fn cancel_rsvp(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
) -> impl Responder {
    match events_service::cancel_rsvp(repo.get_ref(), &user, event_id.into_inner()) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response("cancel rsvp", err),
    }
}

#[get("/events/{event_id}/attendees")]
pub async fn list_attendees(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
    query: web::Query<AttendeesQuery>,
) -> impl Responder {
    json_or_error(
        "list attendees",
        events_service::list_attendees(repo.get_ref(), event_id.into_inner(), query.into_inner()),
    )
}
