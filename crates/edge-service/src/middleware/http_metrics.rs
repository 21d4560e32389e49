//! Prometheus gate.
//!
//! Serves the scrape path directly from the `PrometheusHandle` and records
//! one observation for every other request, including requests rejected by
//! inner gates and framework-level 404/405 responses.

use crate::observability::metrics::record_http_request;
use axum::{
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// State for the Prometheus gate.
pub struct PrometheusGate {
    handle: PrometheusHandle,
    path: String,
    include_latency_histogram: bool,
}

impl PrometheusGate {
    pub fn new(handle: PrometheusHandle, path: impl Into<String>, include_latency_histogram: bool) -> Self {
        Self {
            handle,
            path: path.into(),
            include_latency_histogram,
        }
    }
}

pub async fn prometheus_gate(
    State(gate): State<Arc<PrometheusGate>>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == gate.path {
        return (
            StatusCode::OK,
            [(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            gate.handle.render(),
        )
            .into_response();
    }

    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let duration = gate.include_latency_histogram.then(|| start.elapsed());
    record_http_request(&method, &path, response.status().as_u16(), duration);

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::observability::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};
    use axum::{
        body::Body,
        http::Request as HttpRequest,
        middleware,
        routing::get,
        Router,
    };
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::MetricKind;
    use tower::ServiceExt;

    async fn handler_200() -> &'static str {
        "OK"
    }

    fn test_app(include_latency: bool) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let gate = Arc::new(PrometheusGate::new(handle, "/metrics", include_latency));
        Router::new()
            .route("/success", get(handler_200))
            .layer(middleware::from_fn_with_state(gate, prometheus_gate))
    }

    fn request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("request builder should succeed")
    }

    #[tokio::test]
    async fn test_records_one_counter_per_request() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let response = test_app(false)
            .oneshot(request("/success?x=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let metrics = snapshotter.snapshot().into_vec();
        assert_eq!(metrics.len(), 1);
        let (key, _, _, value) = metrics.first().unwrap();
        assert_eq!(key.key().name(), HTTP_REQUESTS_TOTAL);
        assert!(key
            .key()
            .labels()
            .any(|l| l.key() == "path" && l.value() == "/success"));
        assert_eq!(value, &DebugValue::Counter(1));
    }

    #[tokio::test]
    async fn test_records_not_found() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let response = test_app(false).oneshot(request("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let metrics = snapshotter.snapshot().into_vec();
        let (key, _, _, _) = metrics.first().unwrap();
        assert!(key
            .key()
            .labels()
            .any(|l| l.key() == "status" && l.value() == "404"));
    }

    #[tokio::test]
    async fn test_latency_histogram_when_enabled() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let _guard = metrics::set_default_local_recorder(&recorder);

        test_app(true).oneshot(request("/success")).await.unwrap();

        let metrics = snapshotter.snapshot().into_vec();
        assert_eq!(metrics.len(), 2);
        assert!(metrics
            .iter()
            .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram
                && key.key().name() == HTTP_REQUEST_DURATION_SECONDS));
    }

    #[tokio::test]
    async fn test_scrape_path_is_served_and_not_observed() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let response = test_app(false).oneshot(request("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let _ = response.into_body().collect().await.unwrap();

        assert!(snapshotter.snapshot().into_vec().is_empty());
    }
}
