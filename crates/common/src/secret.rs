//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] types. The JWT signing secret (HS256 shared secret
//! or RS256 public key PEM) is held as a [`SecretString`], so any struct that
//! derives or implements `Debug` around it prints a redacted value.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let secret = SecretString::from("hmac-shared-secret");
//! assert!(!format!("{secret:?}").contains("hmac-shared-secret"));
//! assert_eq!(secret.expose_secret(), "hmac-shared-secret");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
