//! Prometheus metrics recorder, name constants, and the HTTP
//! request-tracking middleware.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Returns the handle used to render `/metrics`. Call once at startup,
/// before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across handlers.

/// HTTP requests total (counter, labels: route, method, status).
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// HTTP request duration seconds (histogram, labels: route).
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
/// Requests refused by rate limiting (counter, labels: scope).
pub const RATE_LIMITED_TOTAL: &str = "rate_limited_total";
/// Chat turns total (counter, labels: model).
pub const CHAT_TURNS_TOTAL: &str = "chat_turns_total";
/// Chat turn duration seconds (histogram).
pub const CHAT_TURN_DURATION_SECONDS: &str = "chat_turn_duration_seconds";
/// Chat turn cost in USD (histogram).
pub const CHAT_TURN_COST_USD: &str = "chat_turn_cost_usd";
/// Sessions created total (counter, labels: kind).
pub const SESSIONS_CREATED_TOTAL: &str = "sessions_created_total";
/// Anonymous sessions removed by cleanup (counter).
pub const SESSIONS_CLEANED_TOTAL: &str = "sessions_cleaned_total";

/// Record a request counter and latency histogram for every route.
///
/// Labels use the matched route pattern, not the raw path, so session
/// IDs do not explode the label space.
pub async fn track_http(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method,
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, "route" => route)
        .record(started.elapsed().as_secs_f64());
    response
}
