//! Repository implementation for member accounts.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::{
    domain::{
        types::UserId,
        user::{NewUser, UpdateProfile, User},
    },
    models::user::{NewUser as DbNewUser, UpdateProfile as DbUpdateProfile, User as DbUser},
    repository::{
        DieselRepository, UserListQuery, UserReader, UserWriter,
        errors::{RepositoryError, RepositoryResult},
    },
};

/// Escapes LIKE wildcards so user input only matches literally.
pub(crate) fn like_pattern(value: &str, contains: bool) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    if contains {
        format!("%{escaped}%")
    } else {
        escaped
    }
}

fn into_domain(users: Vec<DbUser>) -> RepositoryResult<Vec<User>> {
    users
        .into_iter()
        .map(|user| User::try_from(user).map_err(RepositoryError::from))
        .collect()
}

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_user = users::table
            .find(id.get())
            .first::<DbUser>(&mut conn)
            .optional()?;

        db_user
            .map(|user| User::try_from(user).map_err(RepositoryError::from))
            .transpose()
    }

    fn get_user_by_login(&self, login: &str) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let login = login.trim().to_lowercase();
        let db_user = users::table
            .filter(users::username.eq(&login).or(users::email.eq(&login)))
            .first::<DbUser>(&mut conn)
            .optional()?;

        db_user
            .map(|user| User::try_from(user).map_err(RepositoryError::from))
            .transpose()
    }

    fn get_users_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        use crate::schema::users;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;
        let raw_ids = ids.iter().map(|id| id.get()).collect::<Vec<i32>>();
        let db_users = users::table
            .filter(users::id.eq_any(raw_ids))
            .load::<DbUser>(&mut conn)?;

        into_domain(db_users)
    }

    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = users::table.into_boxed::<Sqlite>();

            if let Some(exclude) = query.exclude {
                items = items.filter(users::id.ne(exclude.get()));
            }
            if let Some(car_make) = &query.car_make {
                // LIKE without wildcards is a case-insensitive equality in SQLite.
                items = items.filter(users::car_make.like(like_pattern(car_make, false)).escape('\\'));
            }
            if let Some(location) = &query.location {
                items = items.filter(users::location.like(like_pattern(location, true)).escape('\\'));
            }
            if let Some(min_age) = query.min_age {
                items = items.filter(users::age.ge(min_age));
            }
            if let Some(max_age) = query.max_age {
                items = items.filter(users::age.le(max_age));
            }
            if let Some(search) = &query.search {
                let pattern = like_pattern(search, true);
                items = items.filter(
                    users::username
                        .like(pattern.clone())
                        .escape('\\')
                        .or(users::display_name.like(pattern).escape('\\')),
                );
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order((users::last_active_at.desc(), users::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items.offset(pagination.offset()).limit(pagination.limit());
        }

        let db_users = items.load::<DbUser>(&mut conn)?;

        Ok((total, into_domain(db_users)?))
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let insertable: DbNewUser = new_user.into();

        let db_user = diesel::insert_into(users::table)
            .values(&insertable)
            .get_result::<DbUser>(&mut conn)?;

        User::try_from(db_user).map_err(RepositoryError::from)
    }

    fn update_profile(
        &self,
        id: UserId,
        updates: &UpdateProfile,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let changeset = DbUpdateProfile::from_domain(updates, updated_at);

        let db_user = diesel::update(users::table.find(id.get()))
            .set(&changeset)
            .get_result::<DbUser>(&mut conn)?;

        User::try_from(db_user).map_err(RepositoryError::from)
    }

    fn set_premium(&self, id: UserId, is_premium: bool) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        let db_user = diesel::update(users::table.find(id.get()))
            .set(users::is_premium.eq(is_premium))
            .get_result::<DbUser>(&mut conn)?;

        User::try_from(db_user).map_err(RepositoryError::from)
    }

    fn touch_last_active(&self, id: UserId, at: NaiveDateTime) -> RepositoryResult<()> {
        use crate::schema::users;

        let mut conn = self.conn()?;
        diesel::update(users::table.find(id.get()))
            .set(users::last_active_at.eq(at))
            .execute(&mut conn)?;
        Ok(())
    }
}
