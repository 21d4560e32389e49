//! HTTP routes for the edge service.
//!
//! The application router is small; everything interesting happens in the
//! pipeline wrapped around it.

use crate::config::Config;
use crate::errors::{EdgeError, StartupError};
use crate::handlers;
use crate::pipeline::PipelineBuilder;
use axum::{http::Uri, routing::get, Router};
use std::sync::Arc;

/// Build the application routes.
///
/// - `/api/v1/health` - Liveness probe (prefix-whitelisted by default)
/// - `/api/v1/me` - Verified claims of the caller
pub fn build_app_routes() -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/me", get(handlers::get_me))
        .fallback(not_found)
}

/// Build the application routes wrapped in the pipeline for `config`.
///
/// # Errors
///
/// Returns `StartupError` if any enabled gate cannot be constructed.
pub fn build_routes(config: Arc<Config>) -> Result<Router, StartupError> {
    let pipeline = PipelineBuilder::new(config).build()?;
    Ok(pipeline.wrap(build_app_routes()))
}

async fn not_found(uri: Uri) -> EdgeError {
    tracing::debug!(target: "edge.routes", path = %uri.path(), "No route matched");
    EdgeError::NotFound("Route not found".to_string())
}
