use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date_util::serde_flexible;
use crate::error::{Error, Result};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// Identity of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status as stored.
///
/// Only `PENDING` and `DONE` are accepted on write. Rows written by other
/// tools may carry anything, so reads keep the raw value in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Done => "DONE",
            TaskStatus::Other(s) => s,
        }
    }

    /// Parse a status for writing; unknown values are rejected.
    pub fn parse_strict(s: &str) -> Result<Self> {
        match TaskStatus::from(s.to_string()) {
            TaskStatus::Other(other) => Err(Error::Validation(format!(
                "status must be PENDING or DONE, got '{other}'"
            ))),
            known => Ok(known),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => TaskStatus::Pending,
            "DONE" => TaskStatus::Done,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: u8,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(with = "serde_flexible")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "serde_flexible")]
    pub end_date: DateTime<Utc>,
    pub priority: i64,
}

impl NewTask {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".into()));
        }
        validate_priority(self.priority)?;
        if let Some(status) = &self.status {
            TaskStatus::parse_strict(status.as_str())?;
        }
        Ok(())
    }
}

/// Partial update for a task; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, with = "serde_flexible::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_flexible::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<i64>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(Error::Validation("title must not be empty".into()));
            }
        }
        if let Some(priority) = self.priority {
            validate_priority(priority)?;
        }
        if let Some(status) = &self.status {
            TaskStatus::parse_strict(status.as_str())?;
        }
        Ok(())
    }
}

fn validate_priority(priority: i64) -> Result<u8> {
    match u8::try_from(priority) {
        Ok(p) if (MIN_PRIORITY..=MAX_PRIORITY).contains(&p) => Ok(p),
        _ => Err(Error::Validation(format!(
            "priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
