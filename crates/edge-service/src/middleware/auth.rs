//! Authentication gate.
//!
//! For every request:
//! 1. Compute the effective path (web prefix removed)
//! 2. Whitelisted paths pass with a whitelisted `RequestContext`; nothing is
//!    extracted or verified
//! 3. Otherwise extract a token (cookie first, then `Authorization: Bearer`)
//! 4. Verify it; success passes with an authenticated `RequestContext`
//!
//! Missing tokens are rejected as `NoToken`, anything else as `InvalidToken`.

use crate::auth::extract::{extract_token, Extraction};
use crate::auth::whitelist::effective_path;
use crate::auth::{TokenVerifier, WhitelistRules};
use crate::config::Config;
use crate::context::RequestContext;
use crate::rejection::{ErrorResponder, RejectionReason};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication gate.
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    whitelist: WhitelistRules,
    responder: Arc<ErrorResponder>,
    web_prefix: String,
    cookie_name: String,
    user_property: Arc<str>,
}

impl AuthGate {
    pub fn new(
        config: &Config,
        verifier: Arc<dyn TokenVerifier>,
        responder: Arc<ErrorResponder>,
    ) -> Self {
        Self {
            verifier,
            whitelist: WhitelistRules::from_config(&config.jwt),
            responder,
            web_prefix: config.web_prefix.clone(),
            cookie_name: config.jwt.cookie_token_name.clone(),
            user_property: Arc::from(config.jwt.user_property.as_str()),
        }
    }
}

#[instrument(skip_all, name = "edge.auth.gate")]
pub async fn auth_gate(State(gate): State<Arc<AuthGate>>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();

    if gate.whitelist.matches(effective_path(&path, &gate.web_prefix)) {
        tracing::debug!(target: "edge.auth.gate", path = %path, "Whitelisted path, skipping verification");
        req.extensions_mut()
            .insert(RequestContext::whitelisted(gate.user_property.clone()));
        return next.run(req).await;
    }

    let verified = match extract_token(req.headers(), &gate.cookie_name) {
        Extraction::Found(token) => gate
            .verifier
            .verify(token)
            .map_err(|_| RejectionReason::InvalidToken),
        Extraction::Malformed => Err(RejectionReason::InvalidToken),
        Extraction::Absent => Err(RejectionReason::NoToken),
    };

    match verified {
        Ok(claims) => {
            req.extensions_mut().insert(RequestContext::authenticated(
                claims,
                gate.user_property.clone(),
            ));
            next.run(req).await
        }
        Err(reason) => gate.responder.reject(reason, &path),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::{Claims, VerifyError};
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use serde_json::{json, Map};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Accepts the token "good", counting every call.
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl TokenVerifier for CountingVerifier {
        fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token == "good" {
                let mut map = Map::new();
                map.insert("sub".to_string(), json!("alice"));
                Ok(Claims::new(map))
            } else {
                Err(VerifyError::InvalidSignature)
            }
        }
    }

    async fn context_handler(ctx: Option<Extension<RequestContext>>) -> String {
        match ctx {
            Some(Extension(ctx)) if ctx.is_whitelisted() => "whitelisted".to_string(),
            Some(Extension(ctx)) => ctx
                .claims()
                .and_then(Claims::subject)
                .unwrap_or("anonymous")
                .to_string(),
            None => "none".to_string(),
        }
    }

    fn app(pairs: &[(&str, &str)]) -> (Router, Arc<CountingVerifier>) {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = Config::from_vars(&vars).unwrap();
        let verifier = Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
        });
        let responder = Arc::new(ErrorResponder::from_config(&config.jwt).unwrap());
        let gate = Arc::new(AuthGate::new(&config, verifier.clone(), responder));

        let router = Router::new()
            .route("/api/v1/health", get(context_handler))
            .route("/api/v1/me", get(context_handler))
            .route("/edge/api/v1/health", get(context_handler))
            .layer(middleware::from_fn_with_state(gate, auth_gate));
        (router, verifier)
    }

    fn get_request(uri: &str, headers: &[(&str, &str)]) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        use http_body_util::BodyExt;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_whitelisted_path_skips_verification() {
        let (app, verifier) = app(&[]);

        let response = app
            .oneshot(get_request(
                "/api/v1/health",
                &[("authorization", "Bearer bad")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "whitelisted");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_token_passes_with_claims() {
        let (app, verifier) = app(&[]);

        let response = app
            .oneshot(get_request("/api/v1/me", &[("authorization", "Bearer good")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "alice");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_token_redirects() {
        let (app, verifier) = app(&[]);

        let response = app.oneshot(get_request("/api/v1/me", &[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "http://localhost:18000/login"
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let (app, _) = app(&[("JWT_AUTH_NO_TOKEN_STATUS_CODE", "401")]);

        let response = app
            .oneshot(get_request("/api/v1/me", &[("authorization", "Bearer bad")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get("www-authenticate").is_some());
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected_without_verifying() {
        let (app, verifier) = app(&[("JWT_AUTH_NO_TOKEN_STATUS_CODE", "401")]);

        let response = app
            .oneshot(get_request("/api/v1/me", &[("authorization", "Basic abc")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cookie_token_takes_precedence() {
        let (app, _) = app(&[]);

        let response = app
            .oneshot(get_request(
                "/api/v1/me",
                &[
                    ("authorization", "Bearer bad"),
                    ("cookie", "access_token=good"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "alice");
    }

    #[tokio::test]
    async fn test_web_prefix_removed_before_whitelist_match() {
        let (app, verifier) = app(&[("WEB_PREFIX", "/edge")]);

        let response = app
            .oneshot(get_request("/edge/api/v1/health", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }
}
