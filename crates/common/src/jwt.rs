//! JWT utilities shared across Edge Gate crates.
//!
//! This module provides the token-handling helpers that do not depend on
//! key material:
//! - Size limits for DoS prevention
//! - Clock skew bounds for time-claim validation
//! - `Authorization: Bearer` header parsing
//! - Coercion of claim values into string sets
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Error messages are intentionally generic to prevent information leakage
//! - Claim coercion never fails: unexpected shapes collapse to an empty set
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{check_token_size, parse_bearer};
//!
//! if let Some(token) = parse_bearer(header_value)? {
//!     check_token_size(token)?;
//!     // verify signature...
//! }
//! ```

use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// - Typical JWTs are 200-500 bytes (header + claims + signature)
/// - RS256 tokens with a handful of group claims stay well under 2KB
/// - Checked BEFORE base64 decode and signature verification
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Maximum allowed clock skew tolerance for `exp`/`nbf` validation (10 minutes).
///
/// Prevents misconfiguration that would keep expired tokens usable for long.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Authorization scheme accepted by [`parse_bearer`] (matched case-insensitively).
pub const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while handling a raw token before signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Authorization header is present but not `Bearer <token>`.
    #[error("Authorization header format must be Bearer {{token}}")]
    MalformedAuthorizationHeader,
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` when the token exceeds the limit.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Parse an `Authorization` header value of the form `Bearer <token>`.
///
/// # Returns
///
/// - `Ok(None)` - The header value is empty (no token supplied)
/// - `Ok(Some(token))` - A bearer token was found
///
/// # Errors
///
/// Returns `JwtValidationError::MalformedAuthorizationHeader` when a value is
/// present but is not exactly two parts with a `Bearer` scheme.
pub fn parse_bearer(header_value: &str) -> Result<Option<&str>, JwtValidationError> {
    let trimmed = header_value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut parts = trimmed.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => {
            Ok(Some(token))
        }
        _ => Err(JwtValidationError::MalformedAuthorizationHeader),
    }
}

/// Coerce a claim value into a set of strings.
///
/// Absent, `null` and non-array values yield an empty set. Array items that are
/// not strings are skipped. This never fails: a claim of the wrong shape means
/// "no members", not a rejected request.
#[must_use]
pub fn claim_string_set(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(ToString::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}
