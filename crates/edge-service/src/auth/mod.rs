//! Token authentication building blocks.
//!
//! - `keys` - Resolves the configured secret into a decoding key once
//! - `verifier` - Verifies tokens (`TokenVerifier` seam, `JwtVerifier` impl)
//! - `claims` - The verified payload and group coercion
//! - `whitelist` - Paths that bypass verification
//! - `extract` - Cookie / `Authorization` token lookup

pub mod claims;
pub mod extract;
pub mod keys;
pub mod verifier;
pub mod whitelist;

pub use claims::Claims;
pub use keys::{KeyError, KeyMaterial, SigningMethod};
pub use verifier::{JwtVerifier, TokenVerifier, VerifyError};
pub use whitelist::WhitelistRules;
