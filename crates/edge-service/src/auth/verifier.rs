//! Token verification.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The accepted algorithm is pinned to the configured signing method
//! - `exp`/`nbf`/`iat` are validated when present, with bounded clock skew
//! - Failure details are only logged; callers see a single rejection reason

use crate::auth::claims::Claims;
use crate::auth::keys::KeyMaterial;
use chrono::Utc;
use common::jwt::check_token_size;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Validation};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("token has expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("token was issued in the future")]
    IssuedInFuture,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token exceeds the maximum allowed size")]
    TokenTooLarge,

    #[error("signing key is unavailable")]
    KeyUnavailable,
}

/// Verifies a raw token and returns its claims.
///
/// The auth gate depends on this trait so tests can count or stub calls.
pub trait TokenVerifier: Send + Sync {
    /// # Errors
    ///
    /// Returns a `VerifyError` describing why the token was not accepted.
    fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}

/// `jsonwebtoken`-backed verifier over resolved key material.
pub struct JwtVerifier {
    keys: Arc<KeyMaterial>,
    validation: Validation,
    debug: bool,
}

impl JwtVerifier {
    /// Create a verifier.
    ///
    /// # Arguments
    ///
    /// * `keys` - Key material resolved once at startup
    /// * `clock_skew_seconds` - Leeway applied to `exp` and `nbf`
    /// * `debug` - Log failures at `info` instead of `debug`
    pub fn new(keys: Arc<KeyMaterial>, clock_skew_seconds: u64, debug: bool) -> Self {
        let mut validation = Validation::new(keys.method().algorithm());
        // exp/nbf are checked only when the token carries them
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = clock_skew_seconds;

        Self {
            keys,
            validation,
            debug,
        }
    }

    /// `jsonwebtoken` does not check `iat`; a token issued after now (plus
    /// leeway) is refused.
    fn issued_in_future(&self, claims: &Claims) -> bool {
        let Some(iat) = claims.issued_at() else {
            return false;
        };
        let leeway = i64::try_from(self.validation.leeway).unwrap_or(i64::MAX);
        iat > Utc::now().timestamp().saturating_add(leeway)
    }

    fn log_failure(&self, error: VerifyError, detail: &str) {
        if self.debug {
            tracing::info!(target: "edge.auth.jwt", error = %error, detail = %detail, "Token verification failed");
        } else {
            tracing::debug!(target: "edge.auth.jwt", error = %error, detail = %detail, "Token verification failed");
        }
    }
}

impl TokenVerifier for JwtVerifier {
    #[instrument(skip_all, name = "edge.auth.verify")]
    fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let key = self.keys.key().map_err(|e| {
            tracing::error!(target: "edge.auth.jwt", error = %e, "Verification attempted without a usable key");
            VerifyError::KeyUnavailable
        })?;

        if check_token_size(token).is_err() {
            self.log_failure(VerifyError::TokenTooLarge, "size limit");
            return Err(VerifyError::TokenTooLarge);
        }

        let token_data = decode::<Claims>(token, key, &self.validation).map_err(|e| {
            let error = classify(e.kind());
            self.log_failure(error, &e.to_string());
            error
        })?;

        let claims = token_data.claims;
        if self.issued_in_future(&claims) {
            self.log_failure(VerifyError::IssuedInFuture, "iat is after now");
            return Err(VerifyError::IssuedInFuture);
        }

        tracing::debug!(target: "edge.auth.jwt", "Token verified successfully");
        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> VerifyError {
    match kind {
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => VerifyError::InvalidSignature,
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => VerifyError::KeyUnavailable,
        _ => VerifyError::Malformed,
    }
}
