//! Member profiles: viewing, editing, browsing and premium upgrades.

use chrono::{Datelike, Utc};

use crate::domain::types::UserId;
use crate::dto::user::{BrowseQuery, PrivateProfile, PublicProfile};
use crate::forms::profile::UpdateProfileForm;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{UserListQuery, UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult, current_user_id};

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Public profile of any member.
pub fn get_profile<R>(repo: &R, id: i32) -> ServiceResult<PublicProfile>
where
    R: UserReader + ?Sized,
{
    let id = UserId::new(id).map_err(|_| ServiceError::NotFound)?;
    let user = repo.get_user_by_id(id)?.ok_or(ServiceError::NotFound)?;

    Ok(PublicProfile::from(&user))
}

/// Applies a partial update to the caller's own profile.
pub fn update_profile<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: UpdateProfileForm,
) -> ServiceResult<PrivateProfile>
where
    R: UserReader + UserWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let now = Utc::now();
    let updates = form.into_update(now.year())?;

    let updated = if updates.is_empty() {
        repo.get_user_by_id(user_id)?.ok_or(ServiceError::NotFound)?
    } else {
        repo.update_profile(user_id, &updates, now.naive_utc())
            .map_err(|err| {
                log::error!("Failed to update profile of user {user_id}: {err}");
                err
            })?
    };

    Ok(PrivateProfile::from(&updated))
}

/// Lists other members, most recently active first.
pub fn browse_profiles<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: BrowseQuery,
) -> ServiceResult<Paginated<PublicProfile>>
where
    R: UserReader + ?Sized,
{
    let user_id = current_user_id(user)?;
    let page = query.page.unwrap_or(1).max(1);

    let mut list_query = UserListQuery::new()
        .exclude(user_id)
        .age_range(query.min_age, query.max_age)
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(car_make) = non_blank(query.car_make) {
        list_query = list_query.car_make(car_make);
    }
    if let Some(location) = non_blank(query.location) {
        list_query = list_query.location(location);
    }
    if let Some(search) = non_blank(query.search) {
        list_query = list_query.search(search);
    }

    let (total, users) = repo.list_users(list_query)?;
    let profiles = users.iter().map(PublicProfile::from).collect();

    Ok(Paginated::new(profiles, page, total))
}

/// Marks the caller as a premium member. Calling it again is harmless.
pub fn upgrade_to_premium<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<PrivateProfile>
where
    R: UserReader + UserWriter + ?Sized,
{
    let user_id = current_user_id(user)?;
    let current = repo.get_user_by_id(user_id)?.ok_or(ServiceError::NotFound)?;
    if current.is_premium {
        return Ok(PrivateProfile::from(&current));
    }

    let upgraded = repo.set_premium(user_id, true)?;
    log::info!("User {user_id} upgraded to premium");

    Ok(PrivateProfile::from(&upgraded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support;

    #[test]
    fn browse_excludes_caller_and_trims_filters() {
        let mut repo = MockRepository::new();
        repo.expect_list_users()
            .withf(|query| {
                query.exclude == Some(UserId::new(1).unwrap())
                    && query.car_make.as_deref() == Some("Subaru")
                    && query.location.is_none()
                    && query.pagination.map(|p| p.page) == Some(2)
            })
            .times(1)
            .returning(|_| Ok((21, vec![test_support::user(2, false)])));

        let page = browse_profiles(
            &repo,
            &test_support::member(1),
            BrowseQuery {
                car_make: Some(" Subaru ".to_string()),
                location: Some("   ".to_string()),
                page: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(page.total, 21);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pages, vec![Some(1), Some(2)]);
    }

    #[test]
    fn missing_profile_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id().returning(|_| Ok(None));

        assert!(matches!(get_profile(&repo, 9), Err(ServiceError::NotFound)));
        assert!(matches!(get_profile(&repo, 0), Err(ServiceError::NotFound)));
    }

    #[test]
    fn empty_update_does_not_write() {
        let mut repo = MockRepository::new();
        repo.expect_update_profile().times(0);
        repo.expect_get_user_by_id()
            .times(1)
            .returning(|_| Ok(Some(test_support::user(1, false))));

        let profile =
            update_profile(&repo, &test_support::member(1), UpdateProfileForm::default()).unwrap();

        assert_eq!(profile.profile.username, "driver1");
    }

    #[test]
    fn premium_upgrade_is_idempotent() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|_| Ok(Some(test_support::user(1, true))));
        repo.expect_set_premium().times(0);

        let profile = upgrade_to_premium(&repo, &test_support::member(1)).unwrap();

        assert!(profile.profile.is_premium);
    }

    #[test]
    fn premium_upgrade_sets_flag() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|_| Ok(Some(test_support::user(1, false))));
        repo.expect_set_premium()
            .withf(|id, premium| id.get() == 1 && *premium)
            .times(1)
            .returning(|_, _| Ok(test_support::user(1, true)));

        let profile = upgrade_to_premium(&repo, &test_support::member(1)).unwrap();

        assert!(profile.profile.is_premium);
    }
}
