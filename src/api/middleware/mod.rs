pub mod auth;
pub mod logging;

pub use auth::AuthUser;
pub use logging::log_requests;
