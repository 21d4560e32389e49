//! HTTP request handlers for the application behind the pipeline.

pub mod health;
pub mod me;

pub use health::health_check;
pub use me::get_me;
