pub mod repository;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use rusqlite_migration::{Migrations, M};

use crate::error::{Error, Result};
use crate::models::{Task, UserId};

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;\
                       PRAGMA foreign_keys=ON;\
                       PRAGMA busy_timeout=5000;";

static MIGRATIONS: LazyLock<Migrations<'static>> = LazyLock::new(|| {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial.sql"))])
});

/// SQLite-backed store for users and tasks.
///
/// Holds a writer and a reader connection onto the same WAL-mode file, so
/// statistics and listings never queue behind task writes. In-memory
/// databases share one connection for both.
#[derive(Clone)]
pub struct Database {
    writer: tokio_rusqlite::Connection,
    reader: tokio_rusqlite::Connection,
}

impl Database {
    /// `~/.tasktrack/tasktrack.db`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("cannot determine home directory".into()))?;
        Ok(home.join(".tasktrack").join("tasktrack.db"))
    }

    /// Open the database at [`Database::default_path`].
    pub async fn open() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (creating if needed) the database at `path` and apply migrations.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let writer = tokio_rusqlite::Connection::open(&path).await?;
        Self::migrate(&writer).await?;
        let reader = tokio_rusqlite::Connection::open(&path).await?;
        Self::configure(&reader).await?;

        log::debug!("Opened database at {}", path.display());
        Ok(Self { writer, reader })
    }

    /// Open a fresh in-memory database (for testing).
    pub async fn open_memory() -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open_in_memory().await?;
        Self::migrate(&conn).await?;
        Ok(Self {
            reader: conn.clone(),
            writer: conn,
        })
    }

    async fn configure(conn: &tokio_rusqlite::Connection) -> Result<()> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await?;
        Ok(())
    }

    async fn migrate(conn: &tokio_rusqlite::Connection) -> Result<()> {
        Self::configure(conn).await?;
        conn.call(|conn| MIGRATIONS.to_latest(conn))
            .await
            .map_err(|e| Error::Migration(e.to_string()))
    }

    /// Connection for inserts, updates and deletes.
    pub fn writer(&self) -> &tokio_rusqlite::Connection {
        &self.writer
    }

    /// Connection for queries.
    pub fn reader(&self) -> &tokio_rusqlite::Connection {
        &self.reader
    }
}

/// Read access to a user's tasks, as needed by the statistics engine.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks owned by `owner`, unfiltered and unpaginated.
    async fn find_tasks_by_owner(&self, owner: UserId) -> Result<Vec<Task>>;
}

#[async_trait]
impl TaskStore for Database {
    async fn find_tasks_by_owner(&self, owner: UserId) -> Result<Vec<Task>> {
        self.reader()
            .call(move |conn| repository::list_tasks_by_owner(conn, owner))
            .await
            .map_err(Error::from)
    }
}
