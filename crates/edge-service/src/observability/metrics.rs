//! Prometheus metric definitions for the edge service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `edge_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `method`: bounded by HTTP methods
//! - `status`: numeric status code
//! - `path`: request path without the query string

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const HTTP_REQUESTS_TOTAL: &str = "edge_http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "edge_http_request_duration_seconds";

/// Initialize the global Prometheus recorder and return the handle used to
/// render the scrape response.
///
/// Must be called before any metrics are recorded, at most once per process.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("edge_http_request".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record one completed request.
///
/// Metric: `edge_http_requests_total`, plus `edge_http_request_duration_seconds`
/// when a duration is given.
/// Labels: `status`, `path`, `method`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Option<Duration>) {
    let status = status_code.to_string();

    counter!(
        HTTP_REQUESTS_TOTAL,
        "status" => status.clone(),
        "path" => path.to_string(),
        "method" => method.to_string()
    )
    .increment(1);

    if let Some(duration) = duration {
        histogram!(
            HTTP_REQUEST_DURATION_SECONDS,
            "status" => status,
            "path" => path.to_string(),
            "method" => method.to_string()
        )
        .record(duration.as_secs_f64());
    }
}
