pub mod api;
pub mod auth;
pub mod config;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod models;
pub mod query;
pub mod storage;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use auth::TokenKeys;
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::{compute_stats, PriorityBucket, StatsReport};
pub use models::{NewTask, Task, TaskStatus, TaskUpdate, User, UserId};
pub use query::builder::TaskQuery;
pub use query::sort::SortOrder;
pub use storage::{Database, TaskStore};

use storage::repository;

pub const MIN_PASSWORD_LEN: usize = 8;

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Result of a successful signup or signin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
}

/// Main entry point: accounts, tasks and statistics over one database.
#[derive(Clone)]
pub struct TaskTracker {
    db: Database,
    keys: TokenKeys,
    bcrypt_cost: u32,
}

impl TaskTracker {
    pub fn new(db: Database, keys: TokenKeys, bcrypt_cost: u32) -> Self {
        Self {
            db,
            keys,
            bcrypt_cost,
        }
    }

    /// Build from runtime configuration. Fails if no signing secret is set.
    pub fn from_config(db: Database, config: &Config) -> Result<Self> {
        let keys = TokenKeys::new(config.require_secret()?, config.token_ttl_hours);
        Ok(Self::new(db, keys, config.bcrypt_cost))
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Accounts ───────────────────────────────────────────────────

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<Session> {
        if username.trim().is_empty() {
            return Err(Error::Validation("username must not be empty".into()));
        }
        if !RE_EMAIL.is_match(email) {
            return Err(Error::Validation(format!("'{email}' is not a valid email")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let existing = self
            .db
            .reader()
            .call({
                let email = email.to_string();
                move |conn| repository::find_user_by_email(conn, &email)
            })
            .await?;
        if existing.is_some() {
            return Err(Error::Conflict("User already exists".into()));
        }

        let hash = auth::hash_password(password, self.bcrypt_cost).await?;

        let inserted = self
            .db
            .writer()
            .call({
                let username = username.to_string();
                let email = email.to_string();
                move |conn| {
                    match repository::insert_user(conn, &username, &email, &hash) {
                        Ok(id) => Ok(Some(id)),
                        // Lost a race with a concurrent signup for the same email
                        Err(rusqlite::Error::SqliteFailure(e, _))
                            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                        {
                            Ok(None)
                        }
                        Err(e) => Err(e),
                    }
                }
            })
            .await?;
        let user_id = inserted.ok_or_else(|| Error::Conflict("User already exists".into()))?;

        log::info!("Created user {user_id} <{email}>");
        Ok(Session {
            token: self.keys.issue(user_id)?,
            user_id,
            email: email.to_string(),
        })
    }

    pub async fn signin(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .db
            .reader()
            .call({
                let email = email.to_string();
                move |conn| repository::find_user_by_email(conn, &email)
            })
            .await?
            .ok_or_else(|| Error::NotFound("User not found".into()))?;

        if !auth::verify_password(password, &user.password_hash).await? {
            log::debug!("Rejected signin for user {}", user.id);
            return Err(Error::Unauthenticated("Incorrect password".into()));
        }

        Ok(Session {
            token: self.keys.issue(user.id)?,
            user_id: user.id,
            email: user.email,
        })
    }

    /// Verify a bearer token and return the user it belongs to.
    pub fn authenticate(&self, token: &str) -> Result<UserId> {
        self.keys.verify(token)
    }

    /// Look up a user by numeric id or email.
    pub async fn resolve_user(&self, identifier: &str) -> Result<UserId> {
        self.db
            .reader()
            .call({
                let identifier = identifier.to_string();
                move |conn| repository::resolve_user_identifier(conn, &identifier)
            })
            .await?
            .ok_or_else(|| Error::NotFound(format!("no user matching '{identifier}'")))
    }

    // ── Tasks ──────────────────────────────────────────────────────

    pub async fn list_tasks(&self, query: TaskQuery) -> Result<Vec<Task>> {
        query.tasks(&self.db).await
    }

    pub async fn get_task(&self, owner: UserId, id: i64) -> Result<Task> {
        self.db
            .reader()
            .call(move |conn| repository::get_task(conn, owner, id))
            .await?
            .ok_or_else(|| Error::NotFound("Task not found".into()))
    }

    pub async fn create_task(&self, owner: UserId, task: NewTask) -> Result<i64> {
        task.validate()?;
        let id = self
            .db
            .writer()
            .call(move |conn| repository::insert_task(conn, owner, &task))
            .await?;
        log::debug!("User {owner} created task {id}");
        Ok(id)
    }

    pub async fn update_task(&self, owner: UserId, id: i64, update: TaskUpdate) -> Result<i64> {
        update.validate()?;
        let now = chrono::Utc::now();
        let found = self
            .db
            .writer()
            .call(move |conn| repository::update_task(conn, owner, id, &update, now))
            .await?;
        if !found {
            return Err(Error::NotFound("Task not found or unauthorized".into()));
        }
        Ok(id)
    }

    /// Delete the given tasks; ids not owned by `owner` are skipped.
    pub async fn delete_tasks(&self, owner: UserId, ids: Vec<i64>) -> Result<usize> {
        if ids.is_empty() {
            return Err(Error::Validation("No task IDs provided".into()));
        }
        let deleted = self
            .db
            .writer()
            .call(move |conn| repository::delete_tasks(conn, owner, &ids))
            .await?;
        log::debug!("User {owner} deleted {deleted} task(s)");
        Ok(deleted)
    }

    // ── Stats ──────────────────────────────────────────────────────

    pub async fn stats(&self, owner: UserId) -> Result<StatsReport> {
        compute_stats(&self.db, owner).await
    }
}
