use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers::{auth, health, stats, tasks};
use crate::api::middleware::log_requests;
use crate::api::state::AppState;

/// API routes, without state.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        // Accounts
        .route("/api/v1/auth/signup", post(auth::signup))
        .route("/api/v1/auth/signin", post(auth::signin))
        // Tasks
        .route("/api/v1/task/bulk", get(tasks::list_tasks))
        .route(
            "/api/v1/task",
            post(tasks::create_task).delete(tasks::delete_tasks),
        )
        .route(
            "/api/v1/task/:id",
            get(tasks::get_task).put(tasks::update_task),
        )
        // Statistics
        .route("/api/v1/stats", get(stats::get_stats))
}

/// The complete application: routes, request logging and permissive CORS.
pub fn router(state: AppState) -> Router {
    api_routes()
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenKeys;
    use crate::models::UserId;
    use crate::storage::Database;
    use crate::TaskTracker;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let db = Database::open_memory().await.unwrap();
        let tracker = TaskTracker::new(db, TokenKeys::new("test-secret", 24), 4);
        router(AppState::new(tracker))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn signup(app: &Router, email: &str) -> (String, i64) {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"username": "ann", "email": email, "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["token"].as_str().unwrap().to_string(),
            body["userId"].as_i64().unwrap(),
        )
    }

    fn task_body(title: &str, status: &str, priority: i64, start_hours_ago: i64, span: i64) -> Value {
        let start = Utc::now() - Duration::hours(start_hours_ago);
        json!({
            "title": title,
            "status": status,
            "priority": priority,
            "startDate": start.to_rfc3339(),
            "endDate": (start + Duration::hours(span)).to_rfc3339(),
        })
    }

    #[tokio::test]
    async fn test_root() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"msg": "success"}));

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_signup_and_signin() {
        let app = app().await;
        let (token, user_id) = signup(&app, "ann@example.com").await;
        assert!(!token.is_empty());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/signin",
            None,
            Some(json!({"email": "ann@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], user_id);
        assert_eq!(body["email"], "ann@example.com");
    }

    #[tokio::test]
    async fn test_signup_errors() {
        let app = app().await;
        signup(&app, "ann@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"username": "x", "email": "ann@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "User already exists");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"username": "x", "email": "nope", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({"email": "b@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_signin_errors() {
        let app = app().await;
        signup(&app, "ann@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/signin",
            None,
            Some(json!({"email": "bob@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/signin",
            None,
            Some(json!({"email": "ann@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Incorrect password");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/api/v1/stats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header is missing");

        let (status, body) = send(&app, Method::GET, "/api/v1/task/bulk", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");

        let request = Request::builder()
            .uri("/api/v1/stats")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let app = app().await;
        let (_, user_id) = signup(&app, "ann@example.com").await;
        let stale = TokenKeys::new("test-secret", 1)
            .issue_at(UserId(user_id), Utc::now() - Duration::hours(3))
            .unwrap();

        let (status, body) = send(&app, Method::GET, "/api/v1/stats", Some(&stale), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token has expired");
    }

    #[tokio::test]
    async fn test_task_crud() {
        let app = app().await;
        let (token, user_id) = signup(&app, "ann@example.com").await;
        let token = Some(token.as_str());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/task",
            token,
            Some(task_body("write report", "PENDING", 2, 1, 5)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Task created successfully");
        let id = body["taskId"].as_i64().unwrap();

        let (status, body) = send(&app, Method::GET, &format!("/api/v1/task/{id}"), token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["title"], "write report");
        assert_eq!(body["task"]["userId"], user_id);
        assert_eq!(body["task"]["status"], "PENDING");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/task/{id}"),
            token,
            Some(json!({"status": "DONE"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taskId"], id);

        let (_, body) = send(&app, Method::GET, &format!("/api/v1/task/{id}"), token, None).await;
        assert_eq!(body["task"]["status"], "DONE");
        assert_eq!(body["task"]["priority"], 2);

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/api/v1/task",
            token,
            Some(json!({"ids": [id, 9999]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deletedTasksCount"], 1);
        assert_eq!(body["message"], "1 tasks deleted successfully");

        let (status, body) = send(&app, Method::GET, &format!("/api/v1/task/{id}"), token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found");
    }

    #[tokio::test]
    async fn test_task_input_errors() {
        let app = app().await;
        let (token, _) = signup(&app, "ann@example.com").await;
        let token = Some(token.as_str());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/task",
            token,
            Some(task_body("x", "PENDING", 9, 1, 1)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/task",
            token,
            Some(task_body("x", "BLOCKED", 1, 1, 1)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/v1/task/abc", token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/v1/task/bulk?order=title-up", token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/v1/task/bulk?priority=high", token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/api/v1/task",
            token,
            Some(json!({"ids": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("No task IDs provided"));
    }

    #[tokio::test]
    async fn test_bulk_filters_and_order() {
        let app = app().await;
        let (token, _) = signup(&app, "ann@example.com").await;
        let token = Some(token.as_str());

        for (title, status, priority, ago) in [
            ("a", "PENDING", 3, 5),
            ("b", "DONE", 3, 10),
            ("c", "PENDING", 1, 1),
        ] {
            send(
                &app,
                Method::POST,
                "/api/v1/task",
                token,
                Some(task_body(title, status, priority, ago, 2)),
            )
            .await;
        }

        let (status, body) = send(&app, Method::GET, "/api/v1/task/bulk", token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 3);

        let (_, body) = send(&app, Method::GET, "/api/v1/task/bulk?priority=3", token, None).await;
        assert_eq!(body["tasks"].as_array().unwrap().len(), 2);

        let (_, body) = send(
            &app,
            Method::GET,
            "/api/v1/task/bulk?status=PENDING&order=startDate-asc",
            token,
            None,
        )
        .await;
        let titles: Vec<&str> = body["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["a", "c"]);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/v1/task/bulk?order=startDate-asc&limit=2",
            token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = body["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["b", "a"]);

        let (status, _) = send(&app, Method::GET, "/api/v1/task/bulk?limit=-1", token, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tasks_hidden_from_other_users() {
        let app = app().await;
        let (ann, _) = signup(&app, "ann@example.com").await;
        let (bob, _) = signup(&app, "bob@example.com").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/api/v1/task",
            Some(&ann),
            Some(task_body("private", "PENDING", 1, 1, 1)),
        )
        .await;
        let id = body["taskId"].as_i64().unwrap();

        let (status, _) = send(&app, Method::GET, &format!("/api/v1/task/{id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/v1/task/{id}"),
            Some(&bob),
            Some(json!({"title": "mine now"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found or unauthorized");

        let (_, body) = send(&app, Method::GET, "/api/v1/task/bulk", Some(&bob), None).await;
        assert!(body["tasks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_empty_user() {
        let app = app().await;
        let (token, _) = signup(&app, "ann@example.com").await;

        let (status, body) = send(&app, Method::GET, "/api/v1/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let stats = &body["stats"];
        assert_eq!(stats["totalTasks"], 0);
        assert_eq!(stats["avgCompletionTime"], 0.0);
        assert!(stats.get("completedPercentage").is_none());
        assert!(stats.get("pendingPercentage").is_none());
        assert_eq!(stats["pendingTasksByPriority"], json!({}));
    }

    #[tokio::test]
    async fn test_stats_report() {
        let app = app().await;
        let (token, _) = signup(&app, "ann@example.com").await;
        let token = Some(token.as_str());

        // Done: 10h span. Pending p2: started 2h ago, due in 4h.
        send(&app, Method::POST, "/api/v1/task", token, Some(task_body("d", "DONE", 1, 20, 10))).await;
        send(&app, Method::POST, "/api/v1/task", token, Some(task_body("p", "PENDING", 2, 2, 6))).await;

        let (status, body) = send(&app, Method::GET, "/api/v1/stats", token, None).await;
        assert_eq!(status, StatusCode::OK);
        let stats = &body["stats"];
        assert_eq!(stats["totalTasks"], 2);
        assert_eq!(stats["taskCompleted"], 1);
        assert_eq!(stats["taskPending"], 1);
        assert_eq!(stats["completedPercentage"], 50.0);
        assert_eq!(stats["pendingPercentage"], 50.0);
        assert!((stats["avgCompletionTime"].as_f64().unwrap() - 10.0).abs() < 1e-6);
        assert!((stats["totalTimeSpent"].as_f64().unwrap() - 10.0).abs() < 1e-6);

        let lapsed = stats["totalPendingTimeLapsed"].as_f64().unwrap();
        let remaining = stats["totalPendingTimeRemaining"].as_f64().unwrap();
        assert!((lapsed - 2.0).abs() < 0.01);
        assert!((remaining - 4.0).abs() < 0.01);

        let bucket = &stats["pendingTasksByPriority"]["2"];
        assert_eq!(bucket["pendingTasks"], 1);
        assert!(stats["pendingTasksByPriority"].get("1").is_none());
    }
}
