use std::collections::BTreeMap;

use serde::Serialize;

/// Pending-task figures for one priority level. Times are in hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBucket {
    pub pending_tasks: u64,
    /// Sum of hours elapsed since each task's start (0 for tasks not yet started).
    pub time_lapsed: f64,
    /// Sum of hours left until each task's end (0 for tasks already past due).
    pub time_remaining: f64,
}

/// Completion statistics for one user's task set. Times are in hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total_tasks: u64,
    pub task_completed: u64,
    pub task_pending: u64,
    /// Absent when the user has no tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_percentage: Option<f64>,
    /// Absent when the user has no tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_percentage: Option<f64>,
    /// Mean span of completed tasks; 0 when nothing is completed.
    pub avg_completion_time: f64,
    pub total_time_spent: f64,
    pub total_pending_time_lapsed: f64,
    pub total_pending_time_remaining: f64,
    /// Keyed by priority; only priorities with at least one pending task appear.
    pub pending_tasks_by_priority: BTreeMap<u8, PriorityBucket>,
}

impl StatsReport {
    /// The report for a user with no tasks at all.
    pub fn empty() -> Self {
        Self {
            total_tasks: 0,
            task_completed: 0,
            task_pending: 0,
            completed_percentage: None,
            pending_percentage: None,
            avg_completion_time: 0.0,
            total_time_spent: 0.0,
            total_pending_time_lapsed: 0.0,
            total_pending_time_remaining: 0.0,
            pending_tasks_by_priority: BTreeMap::new(),
        }
    }
}
