//! Key material resolution.
//!
//! The configured secret is turned into a `DecodingKey` exactly once, when the
//! pipeline is built. For RS256 the PEM parse can fail; that outcome is kept
//! alongside the method instead of being discarded, so the builder can refuse
//! to start and a directly constructed verifier still reports it.

use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{Algorithm, DecodingKey};
use std::fmt;
use thiserror::Error;

/// Signature algorithm accepted by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMethod {
    Hs256,
    Rs256,
}

impl SigningMethod {
    /// Parse a configured method tag.
    ///
    /// Unrecognized tags fall back to HS256 with a warning.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HS256" => Self::Hs256,
            "RS256" => Self::Rs256,
            other => {
                tracing::warn!(
                    target: "edge.auth.keys",
                    signing_method = %other,
                    "Unrecognized signing method, falling back to HS256"
                );
                Self::Hs256
            }
        }
    }

    pub fn algorithm(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Rs256 => Algorithm::RS256,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Rs256 => "RS256",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("RS256 public key is not a valid PEM-encoded RSA key: {0}")]
    InvalidRsaPem(String),
}

/// A signing method together with the outcome of parsing its key.
#[derive(Clone)]
pub struct KeyMaterial {
    method: SigningMethod,
    key: Result<DecodingKey, KeyError>,
}

impl KeyMaterial {
    /// Resolve the decoding key for `method` from the configured secret.
    ///
    /// HS256 uses the secret bytes directly and cannot fail. RS256 parses the
    /// secret as a PEM public key; a parse failure is captured, not returned.
    pub fn resolve(method: SigningMethod, secret: &SecretString) -> Self {
        let raw = secret.expose_secret().as_bytes();
        let key = match method {
            SigningMethod::Hs256 => Ok(DecodingKey::from_secret(raw)),
            SigningMethod::Rs256 => DecodingKey::from_rsa_pem(raw).map_err(|e| {
                tracing::error!(
                    target: "edge.auth.keys",
                    error = %e,
                    "Failed to parse RS256 public key"
                );
                KeyError::InvalidRsaPem(e.to_string())
            }),
        };

        Self { method, key }
    }

    pub fn method(&self) -> SigningMethod {
        self.method
    }

    /// The parsed key, or the error captured at resolution.
    pub fn key(&self) -> Result<&DecodingKey, &KeyError> {
        self.key.as_ref()
    }

    /// Surface a captured resolution error.
    ///
    /// # Errors
    ///
    /// Returns the `KeyError` recorded by [`KeyMaterial::resolve`].
    pub fn ensure_usable(&self) -> Result<(), KeyError> {
        match &self.key {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone()),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("method", &self.method)
            .field("usable", &self.key.is_ok())
            .finish()
    }
}
