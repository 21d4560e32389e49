//! Edge service error types.
//!
//! `StartupError` aborts pipeline assembly. `EdgeError` is a request-path
//! fault; its `IntoResponse` impl returns a generic JSON body and logs the
//! details server-side. Auth rejections are not errors here: they are answered
//! by the `ErrorResponder`.

use crate::auth::KeyError;
use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures while assembling the pipeline.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Key material unusable: {0}")]
    KeyMaterial(#[from] KeyError),

    #[error("Invalid header value for {name}: {reason}")]
    InvalidHeaderValue { name: &'static str, reason: String },

    #[error("Metrics recorder error: {0}")]
    MetricsRecorder(String),

    #[error("Statsd client error: {0}")]
    Statsd(#[from] std::io::Error),
}

/// Request-path faults. `Internal` is produced by the panic handler.
///
/// Maps to:
/// - NotFound: 404 Not Found
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        match &self {
            EdgeError::NotFound(resource) => {
                error_body(StatusCode::NOT_FOUND, "NOT_FOUND", resource)
            }
            EdgeError::Internal(detail) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "edge.errors", error = %detail, "Internal error");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred",
                )
            }
        }
    }
}
