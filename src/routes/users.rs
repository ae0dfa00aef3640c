use actix_web::{Responder, get, post, put, web};

use crate::dto::user::BrowseQuery;
use crate::forms::profile::UpdateProfileForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::json_or_error;
use crate::services::profiles as profiles_service;

#[get("/users")]
pub async fn browse_profiles(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    query: web::Query<BrowseQuery>,
) -> impl Responder {
    json_or_error(
        "browse profiles",
        profiles_service::browse_profiles(repo.get_ref(), &user, query.into_inner()),
    )
}

#[put("/users/me")]
pub async fn update_profile(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<UpdateProfileForm>,
) -> impl Responder {
    json_or_error(
        "update profile",
        profiles_service::update_profile(repo.get_ref(), &user, form),
    )
}

#[post("/users/me/premium")]
pub async fn upgrade_to_premium(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    json_or_error(
        "upgrade to premium",
        profiles_service::upgrade_to_premium(repo.get_ref(), &user),
    )
}

#[get("/users/{user_id}")]
pub async fn get_profile(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    user_id: web::Path<i32>,
) -> impl Responder {
    json_or_error(
        "load profile",
        profiles_service::get_profile(repo.get_ref(), user_id.into_inner()),
    )
}
