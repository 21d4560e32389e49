//! Edge Service Library
//!
//! An HTTP front door that runs every request through a configurable chain of
//! gates before it reaches the application:
//!
//! - Panic recovery, compression, request logging
//! - Telemetry (statsd, Prometheus, APM spans)
//! - CORS
//! - Token authentication with path whitelists
//! - Group claim authorization
//! - Static assets, runtime introspection, base path handling
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `auth` - Key resolution, token verification, whitelist, extraction
//! - `context` - Per-request admission state
//! - `rejection` - Redirect / challenge responses for rejected requests
//! - `middleware` - The gates
//! - `pipeline` - Gate ordering and assembly
//! - `observability` - Metrics, statsd, APM tracer
//! - `handlers` / `routes` - The application behind the pipeline
//! - `errors` - Error types with HTTP status code mapping

pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod pipeline;
pub mod rejection;
pub mod routes;
