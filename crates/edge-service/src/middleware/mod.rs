//! Request gates.
//!
//! Each gate is an axum `from_fn_with_state` middleware (or a `tower-http`
//! layer) holding only immutable shared state. Ordering is decided in
//! `crate::pipeline`.

pub mod apm;
pub mod auth;
pub mod cors;
pub mod group_claim;
pub mod http_metrics;
pub mod profiling;
pub mod recovery;
pub mod static_files;
pub mod statsd;
