use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::error::Result;
use crate::models::{Task, TaskStatus, UserId};
use crate::query::sort::{SortField, SortOrder};
use crate::storage::repository::{task_from_row, TASK_COLUMNS};
use crate::storage::Database;

/// Builder for listing one owner's tasks with optional filters.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    owner: UserId,
    priority: Option<i64>,
    status: Option<TaskStatus>,
    order: SortOrder,
    limit: Option<u32>,
}

impl TaskQuery {
    /// Every query is scoped to a single owner.
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            priority: None,
            status: None,
            order: SortOrder::default(),
            limit: None,
        }
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Run the query on the reader connection.
    pub async fn tasks(self, db: &Database) -> Result<Vec<Task>> {
        let tasks = db
            .reader()
            .call(move |conn| {
                let (sql, values) = self.build_sql();
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(values.iter()), task_from_row)?;
                rows.collect::<std::result::Result<Vec<_>, rusqlite::Error>>()
            })
            .await?;
        Ok(tasks)
    }

    fn build_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = vec!["user_id = ?1".to_string()];
        let mut values = vec![Value::Integer(self.owner.0)];

        if let Some(priority) = self.priority {
            values.push(Value::Integer(priority));
            clauses.push(format!("priority = ?{}", values.len()));
        }
        if let Some(status) = &self.status {
            values.push(Value::Text(status.as_str().to_string()));
            clauses.push(format!("status = ?{}", values.len()));
        }

        let mut sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE {} ORDER BY {}",
            clauses.join(" AND "),
            self.order.to_sql()
        );
        // Tie-break so equal sort keys come back in insertion order
        if self.order.field != SortField::Id {
            sql.push_str(", id ASC");
        }
        if let Some(limit) = self.limit {
            values.push(Value::Integer(i64::from(limit)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        (sql, values)
    }
}
