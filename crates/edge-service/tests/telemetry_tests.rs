//! Telemetry gate integration tests.
//!
//! Telemetry sits outside the auth gates, so every request is observed once,
//! including requests the auth gates reject.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use edge_service::config::Config;
use edge_service::observability::metrics::HTTP_REQUESTS_TOTAL;
use edge_service::pipeline::{PipelineBuilder, Stage};
use edge_test_utils::{test_vars, TestTokenBuilder, TEST_HS256_SECRET};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app_routes() -> Router {
    Router::new()
        .route("/public/ping", get(|| async { "pong" }))
        .route("/private", get(|| async { "secret" }))
}

fn build(pairs: &[(&str, &str)]) -> Router {
    let config = Arc::new(Config::from_vars(&test_vars(pairs)).unwrap());
    PipelineBuilder::new(config)
        .metrics_handle(PrometheusBuilder::new().build_recorder().handle())
        .build()
        .unwrap()
        .wrap(app_routes())
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const AUTH: &[(&str, &str)] = &[
    ("JWT_AUTH_ENABLED", "true"),
    ("JWT_AUTH_SECRET", TEST_HS256_SECRET),
    ("JWT_AUTH_PREFIX_WHITELIST_PATHS", "/public"),
    ("JWT_AUTH_NO_TOKEN_STATUS_CODE", "401"),
    ("MIDDLEWARE_VERBOSE_LOGGER_ENABLED", "false"),
];

fn with_auth(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
    let mut pairs = AUTH.to_vec();
    pairs.extend_from_slice(extra);
    pairs
}

/// Sum of `edge_http_requests_total` for the given status label.
fn requests_with_status(
    snapshot: &[(
        metrics_util::CompositeKey,
        Option<metrics::Unit>,
        Option<metrics::SharedString>,
        DebugValue,
    )],
    status: &str,
) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.key().name() == HTTP_REQUESTS_TOTAL)
        .filter(|(key, _, _, _)| {
            key.key()
                .labels()
                .any(|l| l.key() == "status" && l.value() == status)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(n) => *n,
            _ => 0,
        })
        .sum()
}

#[tokio::test]
async fn test_prometheus_observes_rejected_requests() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let app = build(&with_auth(&[("PROMETHEUS_ENABLED", "true")]));

    let response = app.clone().oneshot(get_request("/private")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = TestTokenBuilder::new().sign_hs256_default();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/private")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/public/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(requests_with_status(&snapshot, "401"), 1);
    assert_eq!(requests_with_status(&snapshot, "200"), 2);
}

#[tokio::test]
async fn test_prometheus_scrape_path_bypasses_auth_and_is_not_observed() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let _guard = metrics::set_default_local_recorder(&recorder);

    let app = build(&with_auth(&[
        ("PROMETHEUS_ENABLED", "true"),
        ("PROMETHEUS_PATH", "/internal/metrics"),
    ]));

    let response = app.oneshot(get_request("/internal/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let _ = response.into_body().collect().await.unwrap();

    assert!(snapshotter.snapshot().into_vec().is_empty());
}

#[tokio::test]
async fn test_statsd_observes_rejected_requests() {
    let agent = UdpSocket::bind("127.0.0.1:0").unwrap();
    agent
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let port = agent.local_addr().unwrap().port().to_string();

    let app = build(&[
        ("JWT_AUTH_ENABLED", "true"),
        ("JWT_AUTH_SECRET", TEST_HS256_SECRET),
        ("JWT_AUTH_NO_TOKEN_STATUS_CODE", "401"),
        ("STATSD_ENABLED", "true"),
        ("STATSD_PORT", port.as_str()),
        ("STATSD_PREFIX", "gw."),
    ]);

    let response = app.oneshot(get_request("/private")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut buf = [0u8; 512];
    let n = agent.recv(&mut buf).unwrap();
    assert_eq!(
        String::from_utf8_lossy(&buf[..n]),
        "gw.http.requests.count:1|c|#status:401,path:/private,method:GET"
    );

    let n = agent.recv(&mut buf).unwrap();
    let timing = String::from_utf8_lossy(&buf[..n]).to_string();
    assert!(timing.starts_with("gw.http.requests.duration:"));
    assert!(timing.contains("|ms|#status:401,"));
}

#[test]
fn test_apm_stage_enabled_by_either_source() {
    let statsd = Config::from_vars(&test_vars(&[
        ("STATSD_ENABLED", "true"),
        ("STATSD_APM_ENABLED", "true"),
    ]))
    .unwrap();
    let new_relic = Config::from_vars(&test_vars(&[("NEW_RELIC_ENABLED", "true")])).unwrap();
    let apm_without_statsd =
        Config::from_vars(&test_vars(&[("STATSD_APM_ENABLED", "true")])).unwrap();

    assert!(edge_service::pipeline::enabled_stages(&statsd).contains(&Stage::Apm));
    assert!(edge_service::pipeline::enabled_stages(&new_relic).contains(&Stage::Apm));
    assert!(!edge_service::pipeline::enabled_stages(&apm_without_statsd).contains(&Stage::Apm));
}

#[tokio::test]
async fn test_apm_gate_passes_rejections_through() {
    let app = build(&with_auth(&[("NEW_RELIC_ENABLED", "true")]));

    let response = app.oneshot(get_request("/private")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
