use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{NewTask, Task, TaskStatus, TaskUpdate, User, UserId};

/// Column list shared by every task SELECT; keep in sync with [`task_from_row`].
pub(crate) const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, priority, start_date, end_date, updated_date";

// ── Users ──────────────────────────────────────────────────────────

pub fn insert_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<UserId, rusqlite::Error> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, created_at)
         VALUES (?1, ?2, ?3, datetime('now'))",
        params![username, email, password_hash],
    )?;
    Ok(UserId(conn.last_insert_rowid()))
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, username, email, password_hash FROM users WHERE email = ?1",
        params![email],
        user_from_row,
    )
    .optional()
}

pub fn find_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, username, email, password_hash FROM users WHERE id = ?1",
        params![id.0],
        user_from_row,
    )
    .optional()
}

/// Resolve a user identifier to an id.
/// A numeric identifier is taken as the id itself (if such a user exists);
/// anything else is looked up by email.
pub fn resolve_user_identifier(
    conn: &Connection,
    identifier: &str,
) -> Result<Option<UserId>, rusqlite::Error> {
    if let Ok(id) = identifier.parse::<i64>() {
        return Ok(find_user_by_id(conn, UserId(id))?.map(|u| u.id));
    }
    Ok(find_user_by_email(conn, identifier)?.map(|u| u.id))
}

fn user_from_row(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

// ── Tasks ──────────────────────────────────────────────────────────

/// Insert a task for `owner`. `updated_date` starts out equal to the start date.
pub fn insert_task(
    conn: &Connection,
    owner: UserId,
    task: &NewTask,
) -> Result<i64, rusqlite::Error> {
    let status = task.status.clone().unwrap_or_default();
    conn.execute(
        "INSERT INTO tasks (
            user_id, title, description, status, priority,
            start_date, end_date, updated_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            owner.0,
            task.title,
            task.description,
            status.as_str(),
            task.priority,
            task.start_date,
            task.end_date,
            task.start_date,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_task(conn: &Connection, owner: UserId, id: i64) -> Result<Option<Task>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2"),
        params![id, owner.0],
        task_from_row,
    )
    .optional()
}

/// Apply a partial update. Returns `false` when no task with that id belongs to `owner`.
pub fn update_task(
    conn: &Connection,
    owner: UserId,
    id: i64,
    update: &TaskUpdate,
    now: DateTime<Utc>,
) -> Result<bool, rusqlite::Error> {
    let changed = conn.execute(
        "UPDATE tasks SET
            title = COALESCE(?3, title),
            description = COALESCE(?4, description),
            status = COALESCE(?5, status),
            priority = COALESCE(?6, priority),
            start_date = COALESCE(?7, start_date),
            end_date = COALESCE(?8, end_date),
            updated_date = ?9
         WHERE id = ?1 AND user_id = ?2",
        params![
            id,
            owner.0,
            update.title,
            update.description,
            update.status.as_ref().map(TaskStatus::as_str),
            update.priority,
            update.start_date,
            update.end_date,
            now,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete the listed tasks owned by `owner`; ids belonging to others are ignored.
/// The ids travel as a single JSON array parameter, so any number of them fits.
pub fn delete_tasks(conn: &Connection, owner: UserId, ids: &[i64]) -> Result<usize, rusqlite::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let ids = serde_json::to_string(ids)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "DELETE FROM tasks
         WHERE user_id = ?1 AND id IN (SELECT value FROM json_each(?2))",
        params![owner.0, ids],
    )
}

pub fn list_tasks_by_owner(conn: &Connection, owner: UserId) -> Result<Vec<Task>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![owner.0], task_from_row)?;
    rows.collect()
}

pub(crate) fn task_from_row(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    Ok(Task {
        id: row.get(0)?,
        owner_id: UserId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::from(row.get::<_, String>(4)?),
        priority: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        updated_date: row.get(8)?,
    })
}

// ── Status ─────────────────────────────────────────────────────────

/// Row counts for the `status` command: (users, tasks, pending, done).
pub fn count_rows(conn: &Connection) -> Result<(i64, i64, i64, i64), rusqlite::Error> {
    let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    conn.query_row(
        "SELECT
            COUNT(*),
            COALESCE(SUM(CASE WHEN status = 'PENDING' THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN status = 'DONE' THEN 1 ELSE 0 END), 0)
         FROM tasks",
        [],
        |row| Ok((users, row.get(0)?, row.get(1)?, row.get(2)?)),
    )
}
