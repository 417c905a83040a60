//! HTTP request layer: JSON routes over a [`TaskTracker`](crate::TaskTracker).

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;
