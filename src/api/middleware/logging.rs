use std::time::{Duration, Instant};

use axum::{extract::Request, middleware::Next, response::Response};

const SLOW_REQUEST: Duration = Duration::from_millis(100);

/// Log every request with its status and latency; warn on slow ones.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    log::debug!("Request: {method} {uri}");

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    if elapsed > SLOW_REQUEST {
        log::warn!("Slow request: {method} {uri} took {elapsed:?}");
    }
    log::info!(
        "{method} {uri} -> {} in {:.2}ms",
        response.status(),
        elapsed.as_secs_f64() * 1000.0
    );

    response
}
