//! Runtime introspection endpoints under `/debug/pprof/`.
//!
//! - `/debug/pprof/` - index of the endpoints below
//! - `/debug/pprof/cmdline` - process arguments, NUL separated
//! - `/debug/pprof/runtime` - tokio worker count, pid and uptime
//!
//! Other paths continue inward.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub const PPROF_ROOT: &str = "/debug/pprof";

const INDEX: &str = "/debug/pprof/\n\ncmdline: process command line\nruntime: async runtime statistics\n";

pub struct Profiler {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct RuntimeStats {
    pub pid: u32,
    pub workers: usize,
    pub started_at: String,
    pub uptime_seconds: u64,
}

pub async fn profiling_gate(
    State(profiler): State<Arc<Profiler>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(rest) = request.uri().path().strip_prefix(PPROF_ROOT) else {
        return next.run(request).await;
    };

    match rest {
        "" | "/" => (StatusCode::OK, INDEX).into_response(),
        "/cmdline" => {
            let args: Vec<String> = std::env::args().collect();
            (StatusCode::OK, args.join("\0")).into_response()
        }
        "/runtime" => Json(RuntimeStats {
            pid: std::process::id(),
            workers: tokio::runtime::Handle::current().metrics().num_workers(),
            started_at: profiler.started_at.to_rfc3339(),
            uptime_seconds: profiler.started.elapsed().as_secs(),
        })
        .into_response(),
        _ => next.run(request).await,
    }
}
