//! Common utilities shared across Edge Gate crates.

#![warn(clippy::pedantic)]

/// Module for environment value parsing
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT helpers that do not depend on key material
pub mod jwt;
