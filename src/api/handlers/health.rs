use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "msg": "success" }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.uptime_seconds(),
    }))
}
