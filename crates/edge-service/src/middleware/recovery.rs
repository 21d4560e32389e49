//! Panic recovery.
//!
//! A panic anywhere inside the pipeline is logged and answered with a generic
//! 500 JSON body; the connection task survives.

use crate::errors::EdgeError;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;

pub type RecoveryLayer = CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response>;

pub fn recovery_layer() -> RecoveryLayer {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(target: "edge.recovery", "Request handler panicked");
    EdgeError::Internal(format!("panic: {detail}")).into_response()
}
