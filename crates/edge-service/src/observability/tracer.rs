//! APM tracer lifecycle.
//!
//! Request spans are produced by the APM gate through `tracing` and go
//! wherever the installed subscriber sends them. The tracer is a lifecycle
//! marker only: `start` and `stop` log the configured agent and service name,
//! nothing is exported to the agent address.

use crate::config::Config;

/// Agent named in the tracer's lifecycle logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApmAgent {
    /// Datadog-style trace agent on the statsd host.
    Statsd { address: String },
    /// New Relic application.
    NewRelic,
}

#[derive(Debug, Clone)]
pub struct ApmTracer {
    agent: ApmAgent,
    service_name: String,
}

impl ApmTracer {
    /// The tracer for this configuration, if APM is enabled.
    ///
    /// Statsd APM takes precedence when both are enabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        if config.statsd.enabled && config.statsd.apm_enabled {
            Some(Self {
                agent: ApmAgent::Statsd {
                    address: format!("{}:{}", config.statsd.host, config.statsd.apm_port),
                },
                service_name: config.statsd.apm_service_name.clone(),
            })
        } else if config.new_relic_enabled {
            Some(Self {
                agent: ApmAgent::NewRelic,
                service_name: config.new_relic_app_name.clone(),
            })
        } else {
            None
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn start(&self) {
        match &self.agent {
            ApmAgent::Statsd { address } => tracing::info!(
                target: "edge.apm",
                service = %self.service_name,
                agent = %address,
                "APM tracer started"
            ),
            ApmAgent::NewRelic => tracing::info!(
                target: "edge.apm",
                app_name = %self.service_name,
                "New Relic tracer started"
            ),
        }
    }

    pub fn stop(&self) {
        tracing::info!(target: "edge.apm", service = %self.service_name, "APM tracer stopped");
    }
}
