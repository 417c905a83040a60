use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::error::ApiResult;
use crate::api::middleware::AuthUser;
use crate::api::state::AppState;

/// `GET /api/v1/stats`: completion statistics for the caller's tasks.
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
) -> ApiResult<Json<Value>> {
    let stats = state.tracker.stats(owner).await?;
    Ok(Json(json!({ "stats": stats })))
}
