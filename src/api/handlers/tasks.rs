use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;
use crate::models::{NewTask, TaskStatus, TaskUpdate, UserId};
use crate::query::builder::TaskQuery;
use crate::query::sort::SortOrder;

/// Query string for the bulk listing. Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct BulkParams {
    pub priority: Option<String>,
    pub status: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
}

impl BulkParams {
    fn into_query(self, owner: UserId) -> ApiResult<TaskQuery> {
        let mut query = TaskQuery::new(owner);
        if let Some(priority) = self.priority.filter(|s| !s.is_empty()) {
            let priority = priority
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("priority is not a number: {priority}")))?;
            query = query.priority(priority);
        }
        if let Some(status) = self.status.filter(|s| !s.is_empty()) {
            query = query.status(TaskStatus::from(status));
        }
        if let Some(order) = self.order.filter(|s| !s.is_empty()) {
            query = query.order(SortOrder::parse(&order)?);
        }
        if let Some(limit) = self.limit.filter(|s| !s.is_empty()) {
            let limit = limit
                .parse::<u32>()
                .map_err(|_| ApiError::BadRequest(format!("limit is not a count: {limit}")))?;
            query = query.limit(limit);
        }
        Ok(query)
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<i64>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    params: Result<Query<BulkParams>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(params) = params?;
    let tasks = state.tracker.list_tasks(params.into_query(owner)?).await?;
    Ok(Json(json!({
        "message": "Tasks fetched successfully",
        "tasks": tasks,
    })))
}

pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let task = state.tracker.get_task(owner, id).await?;
    Ok(Json(json!({
        "message": "Task fetched successfully",
        "task": task,
    })))
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    body: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(task) = body?;
    let id = state.tracker.create_task(owner, task).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Task created successfully",
            "taskId": id,
        })),
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<TaskUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(update) = body?;
    let id = state.tracker.update_task(owner, id, update).await?;
    Ok(Json(json!({
        "message": "Task updated successfully",
        "taskId": id,
    })))
}

pub async fn delete_tasks(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = body?;
    let deleted = state.tracker.delete_tasks(owner, req.ids).await?;
    Ok(Json(json!({
        "message": format!("{deleted} tasks deleted successfully"),
        "deletedTasksCount": deleted,
    })))
}
