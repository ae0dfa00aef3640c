#![allow(dead_code)]

use chrono::{NaiveDateTime, Utc};
use tempfile::TempDir;

use carmatch::db::{DbPool, establish_connection_pool, run_migrations};
use carmatch::domain::types::{DisplayName, UserEmail, Username};
use carmatch::domain::user::{NewUser, User};
use carmatch::repository::{DieselRepository, UserWriter};

/// SQLite database in a temporary directory, migrated on creation and
/// removed on drop.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("build pool");
        run_migrations(&pool).expect("run migrations");
        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn create_user(repo: &DieselRepository, username: &str) -> User {
    repo.create_user(&NewUser {
        username: Username::new(username).unwrap(),
        email: UserEmail::new(format!("{username}@example.com")).unwrap(),
        password_hash: "not-a-real-hash".to_string(),
        display_name: DisplayName::new(username).unwrap(),
        created_at: now(),
    })
    .unwrap()
}
