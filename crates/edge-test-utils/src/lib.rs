//! # Edge Test Utilities
//!
//! Shared test utilities for the edge service.
//!
//! This crate provides:
//! - Deterministic key material (`crypto_fixtures`)
//! - Token builders for HS256 / RS256 (`token_builders`)
//! - Configuration helpers (`test_vars`)
//! - Server test harness (`TestEdgeServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edge_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestEdgeServer::spawn(&[
//!         ("JWT_AUTH_ENABLED", "true"),
//!         ("JWT_AUTH_SECRET", TEST_HS256_SECRET),
//!     ])
//!     .await?;
//!
//!     let token = TestTokenBuilder::new().for_user("alice").sign_hs256_default();
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/v1/me", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

use std::collections::HashMap;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;

/// Build a configuration variable map from string pairs.
pub fn test_vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
