//! Current principal handler.
//!
//! Reads the `RequestContext` left by the auth gate and returns the verified
//! claims under the configured user property.

use crate::context::RequestContext;
use axum::{Extension, Json};
use serde_json::{Map, Value};

/// `GET /api/v1/me`
///
/// Without an auth gate in the pipeline there is no context and the response
/// reports an anonymous principal.
pub async fn get_me(ctx: Option<Extension<RequestContext>>) -> Json<Value> {
    let mut body = Map::new();

    match ctx {
        Some(Extension(ctx)) => {
            body.insert("whitelisted".to_string(), Value::Bool(ctx.is_whitelisted()));
            body.insert(
                "authenticated".to_string(),
                Value::Bool(ctx.claims().is_some()),
            );
            let claims = ctx
                .claims()
                .map(|c| Value::Object(c.as_map().clone()))
                .unwrap_or(Value::Null);
            body.insert(ctx.user_property().to_string(), claims);
        }
        None => {
            body.insert("whitelisted".to_string(), Value::Bool(false));
            body.insert("authenticated".to_string(), Value::Bool(false));
        }
    }

    Json(Value::Object(body))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_authenticated_principal() {
        let claims: Claims = serde_json::from_value(json!({"sub": "alice"})).unwrap();
        let ctx = RequestContext::authenticated(claims, Arc::from("principal"));

        let Json(body) = get_me(Some(Extension(ctx))).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["whitelisted"], false);
        assert_eq!(body["principal"]["sub"], "alice");
    }

    #[tokio::test]
    async fn test_whitelisted_principal() {
        let ctx = RequestContext::whitelisted(Arc::from("user"));
        let Json(body) = get_me(Some(Extension(ctx))).await;
        assert_eq!(body["whitelisted"], true);
        assert_eq!(body["user"], Value::Null);
    }

    #[tokio::test]
    async fn test_no_context() {
        let Json(body) = get_me(None).await;
        assert_eq!(body["authenticated"], false);
    }
}
