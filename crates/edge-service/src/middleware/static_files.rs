//! Static asset gate.
//!
//! `GET`/`HEAD` requests under the web prefix whose path names an existing
//! file (or a directory with `index.html`) in the static directory are served
//! by `ServeDir`. Everything else continues inward.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, Uri},
    middleware::Next,
    response::Response,
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;

pub struct StaticFiles {
    root: PathBuf,
    web_prefix: String,
    serve_dir: ServeDir,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, web_prefix: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            serve_dir: ServeDir::new(&root),
            root,
            web_prefix: web_prefix.into(),
        }
    }

    /// The path relative to the static root, when the request is in scope.
    fn relative_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = if self.web_prefix.is_empty() {
            path
        } else {
            path.strip_prefix(self.web_prefix.as_str())?
        };
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let relative = rest.trim_start_matches('/');
        let escapes = Path::new(relative)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        (!escapes).then_some(relative)
    }

    async fn exists(&self, relative: &str) -> bool {
        let candidate = self.root.join(relative);
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => true,
            Ok(meta) if meta.is_dir() => tokio::fs::metadata(candidate.join("index.html"))
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            _ => false,
        }
    }
}

pub async fn static_gate(
    State(files): State<Arc<StaticFiles>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return next.run(request).await;
    }

    let Some(relative) = files.relative_path(request.uri().path()).map(str::to_string) else {
        return next.run(request).await;
    };
    if !files.exists(&relative).await {
        return next.run(request).await;
    }

    let target = match request.uri().query() {
        Some(query) => format!("/{relative}?{query}"),
        None => format!("/{relative}"),
    };
    let Ok(uri) = target.parse::<Uri>() else {
        return next.run(request).await;
    };
    *request.uri_mut() = uri;

    match files.serve_dir.clone().oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
