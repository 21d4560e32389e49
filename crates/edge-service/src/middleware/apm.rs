//! APM gate: one `edge.apm.request` span per request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::Instrument;

pub struct ApmGate {
    service_name: String,
}

impl ApmGate {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

pub async fn apm_gate(State(gate): State<Arc<ApmGate>>, request: Request, next: Next) -> Response {
    let span = tracing::info_span!(
        target: "edge.apm",
        "edge.apm.request",
        service = %gate.service_name,
        method = %request.method(),
        path = %request.uri().path(),
        status = tracing::field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;
    span.record("status", response.status().as_u16());
    response
}
