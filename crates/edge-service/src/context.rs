//! Per-request admission state.
//!
//! The auth gate inserts a [`RequestContext`] into the request extensions; the
//! group claim gate and handlers read it. It is built whole and has no setters.

use crate::auth::Claims;
use std::sync::Arc;

/// What the auth gate decided about a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    whitelisted: bool,
    claims: Option<Arc<Claims>>,
    user_property: Arc<str>,
}

impl RequestContext {
    /// The request matched a whitelist rule; nothing was verified.
    pub fn whitelisted(user_property: Arc<str>) -> Self {
        Self {
            whitelisted: true,
            claims: None,
            user_property,
        }
    }

    /// The request carried a valid token.
    pub fn authenticated(claims: Claims, user_property: Arc<str>) -> Self {
        Self {
            whitelisted: false,
            claims: Some(Arc::new(claims)),
            user_property,
        }
    }

    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_deref()
    }

    /// Name the claims are exposed under to handlers.
    pub fn user_property(&self) -> &str {
        &self.user_property
    }
}
