//! Group claim gate.
//!
//! Runs after the auth gate and reads the `RequestContext` it left behind.
//! Whitelisted requests pass. Requests without verified claims, or whose
//! `groups` claim does not contain the required group, are rejected.

use crate::context::RequestContext;
use crate::rejection::{ErrorResponder, RejectionReason};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the group claim gate.
pub struct GroupClaimGate {
    required_group: String,
    responder: Arc<ErrorResponder>,
}

impl GroupClaimGate {
    pub fn new(required_group: impl Into<String>, responder: Arc<ErrorResponder>) -> Self {
        Self {
            required_group: required_group.into(),
            responder,
        }
    }

    fn authorize(&self, ctx: Option<&RequestContext>) -> Result<(), RejectionReason> {
        let Some(ctx) = ctx else {
            tracing::warn!(target: "edge.auth.group", "No request context; is the auth gate installed?");
            return Err(RejectionReason::NoToken);
        };

        if ctx.is_whitelisted() {
            return Ok(());
        }

        let Some(claims) = ctx.claims() else {
            return Err(RejectionReason::NoToken);
        };

        if claims.is_member_of(&self.required_group) {
            Ok(())
        } else {
            tracing::debug!(
                target: "edge.auth.group",
                required_group = %self.required_group,
                "Principal is not a member of the required group"
            );
            Err(RejectionReason::NotInRequiredGroup)
        }
    }
}

#[instrument(skip_all, name = "edge.auth.group")]
pub async fn group_claim_gate(
    State(gate): State<Arc<GroupClaimGate>>,
    req: Request,
    next: Next,
) -> Response {
    match gate.authorize(req.extensions().get::<RequestContext>()) {
        Ok(()) => next.run(req).await,
        Err(reason) => gate.responder.reject(reason, req.uri().path()),
    }
}
