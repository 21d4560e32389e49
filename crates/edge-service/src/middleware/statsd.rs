//! Statsd gate: one request counter and one timing per request.

use crate::observability::statsd::StatsdClient;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

pub const REQUEST_COUNT_METRIC: &str = "http.requests.count";
pub const REQUEST_DURATION_METRIC: &str = "http.requests.duration";

pub async fn statsd_gate(
    State(client): State<Arc<StatsdClient>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let millis = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status().as_u16().to_string();
    let tags = [
        ("status", status.as_str()),
        ("path", path.as_str()),
        ("method", method.as_str()),
    ];
    client.incr(REQUEST_COUNT_METRIC, &tags);
    client.timing(REQUEST_DURATION_METRIC, millis, &tags);

    response
}
