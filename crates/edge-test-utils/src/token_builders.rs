//! Builder patterns for test tokens
//!
//! Provides a fluent API for creating signed HS256/RS256 tokens.

use crate::crypto_fixtures::{TEST_HS256_SECRET, TEST_RSA_PRIVATE_KEY_PEM};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for creating signed test tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_groups(&["admin"])
///     .expires_in(3600)
///     .sign_hs256(TEST_HS256_SECRET);
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with `sub`, `iat` and a one hour `exp`.
    pub fn new() -> Self {
        let now = Utc::now();
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!("test-subject"));
        claims.insert("iat".to_string(), json!(now.timestamp()));
        claims.insert(
            "exp".to_string(),
            json!((now + Duration::seconds(3600)).timestamp()),
        );
        Self { claims }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.claims.insert("sub".to_string(), json!(subject));
        self
    }

    /// Set the `groups` claim to an array of strings
    pub fn with_groups(mut self, groups: &[&str]) -> Self {
        self.claims.insert("groups".to_string(), json!(groups));
        self
    }

    /// Set an arbitrary claim (used for malformed `groups` shapes)
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.claims.insert(
            "exp".to_string(),
            json!((Utc::now() + Duration::seconds(seconds)).timestamp()),
        );
        self
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.claims.insert(
            "nbf".to_string(),
            json!((Utc::now() + Duration::seconds(seconds)).timestamp()),
        );
        self
    }

    /// Drop the `exp` claim entirely
    pub fn without_expiry(mut self) -> Self {
        self.claims.remove("exp");
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        Value::Object(self.claims)
    }

    /// Sign with HS256 using the given shared secret
    pub fn sign_hs256(self, secret: &str) -> String {
        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &self.claims, &key)
            .expect("HS256 signing should succeed")
    }

    /// Sign with HS256 using [`TEST_HS256_SECRET`]
    pub fn sign_hs256_default(self) -> String {
        self.sign_hs256(TEST_HS256_SECRET)
    }

    /// Sign with RS256 using the fixture private key
    pub fn sign_rs256(self) -> String {
        let key = EncodingKey::from_rsa_pem(TEST_RSA_PRIVATE_KEY_PEM.as_bytes())
            .expect("fixture RSA key should parse");
        encode(&Header::new(Algorithm::RS256), &self.claims, &key)
            .expect("RS256 signing should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_valid_claims() {
        let claims = TestTokenBuilder::new()
            .for_user("alice")
            .with_groups(&["admin", "ops"])
            .build();

        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["groups"], json!(["admin", "ops"]));
        assert!(claims["exp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_without_expiry_removes_exp() {
        let claims = TestTokenBuilder::new().without_expiry().build();
        assert!(claims.get("exp").is_none());
    }

    #[test]
    fn test_signed_tokens_have_three_segments() {
        assert_eq!(TestTokenBuilder::new().sign_hs256_default().split('.').count(), 3);
        assert_eq!(TestTokenBuilder::new().sign_rs256().split('.').count(), 3);
    }
}
