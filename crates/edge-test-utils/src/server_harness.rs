//! Test server harness for E2E testing
//!
//! Provides `TestEdgeServer` for spawning a real edge server in tests.

use crate::test_vars;
use edge_service::config::Config;
use edge_service::pipeline::PipelineBuilder;
use edge_service::routes;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the edge server in E2E tests.
///
/// The Prometheus stage gets a private recorder handle so that several
/// servers can run in one test binary without fighting over the global
/// recorder.
pub struct TestEdgeServer {
    addr: SocketAddr,
    config: Arc<Config>,
    _handle: JoinHandle<()>,
}

impl TestEdgeServer {
    /// Spawn a server configured from `pairs` (environment-style variables).
    ///
    /// The server binds to a random available port (127.0.0.1:0) and serves
    /// the real application routes behind the configured pipeline.
    pub async fn spawn(pairs: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let config = Config::from_vars(&test_vars(pairs))
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;
        let config = Arc::new(config);

        let pipeline = PipelineBuilder::new(config.clone())
            .metrics_handle(PrometheusBuilder::new().build_recorder().handle())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build pipeline: {}", e))?;
        let app = pipeline.wrap(routes::build_app_routes());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestEdgeServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
