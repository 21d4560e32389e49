//! Observability: Prometheus metrics, statsd client, APM tracer.

pub mod metrics;
pub mod statsd;
pub mod tracer;
