pub mod types;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

pub use types::*;

use crate::date_util::{hours_between, hours_between_clamped};
use crate::error::Result;
use crate::models::{Task, TaskStatus, UserId};
use crate::storage::TaskStore;

/// Compute completion statistics for `owner`'s tasks as of now.
pub async fn compute_stats<S>(store: &S, owner: UserId) -> Result<StatsReport>
where
    S: TaskStore + ?Sized,
{
    let tasks = store.find_tasks_by_owner(owner).await?;
    let report = aggregate(&tasks, Utc::now());
    log::debug!(
        "Computed stats for user {owner}: {} tasks, {} done, {} pending",
        report.total_tasks,
        report.task_completed,
        report.task_pending
    );
    Ok(report)
}

/// Fold a task set into a report. Every lapsed/remaining figure is measured
/// against the same `now`.
pub fn aggregate(tasks: &[Task], now: DateTime<Utc>) -> StatsReport {
    if tasks.is_empty() {
        return StatsReport::empty();
    }

    let totals = tasks
        .iter()
        .fold(Totals::default(), |acc, task| acc.add(task, now));

    if totals.unrecognized > 0 {
        log::warn!(
            "{} task(s) with a status other than PENDING/DONE were counted in totalTasks only",
            totals.unrecognized
        );
    }

    totals.into_report()
}

#[derive(Debug, Default)]
struct Totals {
    total: u64,
    completed: u64,
    pending: u64,
    unrecognized: u64,
    time_spent: f64,
    pending_lapsed: f64,
    pending_remaining: f64,
    by_priority: BTreeMap<u8, PriorityBucket>,
}

impl Totals {
    fn add(mut self, task: &Task, now: DateTime<Utc>) -> Self {
        self.total += 1;
        match task.status {
            TaskStatus::Done => {
                self.completed += 1;
                self.time_spent += hours_between(task.start_date, task.end_date);
            }
            TaskStatus::Pending => {
                let lapsed = hours_between_clamped(task.start_date, now);
                let remaining = hours_between_clamped(now, task.end_date);
                self.pending += 1;
                self.pending_lapsed += lapsed;
                self.pending_remaining += remaining;

                let bucket = self.by_priority.entry(task.priority).or_default();
                bucket.pending_tasks += 1;
                bucket.time_lapsed += lapsed;
                bucket.time_remaining += remaining;
            }
            TaskStatus::Other(_) => {
                self.unrecognized += 1;
            }
        }
        self
    }

    fn into_report(self) -> StatsReport {
        let total = self.total as f64;
        let avg_completion_time = if self.completed > 0 {
            self.time_spent / self.completed as f64
        } else {
            0.0
        };

        StatsReport {
            total_tasks: self.total,
            task_completed: self.completed,
            task_pending: self.pending,
            completed_percentage: Some(self.completed as f64 / total * 100.0),
            pending_percentage: Some(self.pending as f64 / total * 100.0),
            avg_completion_time,
            total_time_spent: self.time_spent,
            total_pending_time_lapsed: self.pending_lapsed,
            total_pending_time_remaining: self.pending_remaining,
            pending_tasks_by_priority: self.by_priority,
        }
    }
}
