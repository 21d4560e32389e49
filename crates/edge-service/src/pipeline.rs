//! Pipeline assembly.
//!
//! Gate ordering lives in one declarative table, [`STAGES`], listed outermost
//! first. The builder evaluates each stage's predicate against the
//! configuration once, constructs the enabled gates with their shared state,
//! and returns a [`Pipeline`] that wraps an application router.
//!
//! ```text
//! Recovery -> Compression -> VerboseLogging -> Statsd -> Prometheus -> Apm
//!   -> Cors -> Auth -> GroupClaim -> Static -> Profiling -> [StripPrefix] -> app
//! ```
//!
//! Telemetry sits outside the auth gates so rejected requests are observed.
//! The group claim gate sits inside the auth gate because it reads the
//! `RequestContext` the auth gate inserts.

use crate::auth::{JwtVerifier, KeyMaterial, SigningMethod, TokenVerifier};
use crate::config::Config;
use crate::errors::StartupError;
use crate::middleware::{
    apm::{apm_gate, ApmGate},
    auth::{auth_gate, AuthGate},
    cors::cors_layer,
    group_claim::{group_claim_gate, GroupClaimGate},
    http_metrics::{prometheus_gate, PrometheusGate},
    profiling::{profiling_gate, Profiler},
    recovery::recovery_layer,
    static_files::{static_gate, StaticFiles},
    statsd::statsd_gate,
};
use crate::observability::metrics::init_metrics_recorder;
use crate::observability::statsd::StatsdClient;
use crate::observability::tracer::ApmTracer;
use crate::rejection::ErrorResponder;
use axum::{middleware, Router};
use common::secret::ExposeSecret;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// A position in the gate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Recovery,
    Compression,
    VerboseLogging,
    Statsd,
    Prometheus,
    Apm,
    Cors,
    Auth,
    GroupClaim,
    Static,
    Profiling,
    StripPrefix,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Recovery => "recovery",
            Stage::Compression => "compression",
            Stage::VerboseLogging => "verbose_logging",
            Stage::Statsd => "statsd",
            Stage::Prometheus => "prometheus",
            Stage::Apm => "apm",
            Stage::Cors => "cors",
            Stage::Auth => "auth",
            Stage::GroupClaim => "group_claim",
            Stage::Static => "static",
            Stage::Profiling => "profiling",
            Stage::StripPrefix => "strip_prefix",
        }
    }
}

/// Every stage with the predicate that enables it, outermost first.
pub const STAGES: &[(Stage, fn(&Config) -> bool)] = &[
    (Stage::Recovery, always),
    (Stage::Compression, gzip_enabled),
    (Stage::VerboseLogging, verbose_logger_enabled),
    (Stage::Statsd, statsd_enabled),
    (Stage::Prometheus, prometheus_enabled),
    (Stage::Apm, apm_enabled),
    (Stage::Cors, cors_enabled),
    (Stage::Auth, jwt_auth_enabled),
    (Stage::GroupClaim, group_claim_required),
    (Stage::Static, always),
    (Stage::Profiling, pprof_enabled),
    (Stage::StripPrefix, web_prefix_set),
];

fn always(_: &Config) -> bool {
    true
}

fn gzip_enabled(config: &Config) -> bool {
    config.gzip_enabled
}

fn verbose_logger_enabled(config: &Config) -> bool {
    config.verbose_logger_enabled
}

fn statsd_enabled(config: &Config) -> bool {
    config.statsd.enabled
}

fn prometheus_enabled(config: &Config) -> bool {
    config.prometheus.enabled
}

fn apm_enabled(config: &Config) -> bool {
    config.apm_enabled()
}

fn cors_enabled(config: &Config) -> bool {
    config.cors_enabled
}

fn jwt_auth_enabled(config: &Config) -> bool {
    config.jwt.enabled
}

fn group_claim_required(config: &Config) -> bool {
    !config.jwt.require_group_claim.is_empty()
}

fn pprof_enabled(config: &Config) -> bool {
    config.pprof_enabled
}

fn web_prefix_set(config: &Config) -> bool {
    !config.web_prefix.is_empty()
}

/// The stages enabled by `config`, outermost first.
pub fn enabled_stages(config: &Config) -> Vec<Stage> {
    STAGES
        .iter()
        .filter(|(_, enabled)| enabled(config))
        .map(|(stage, _)| *stage)
        .collect()
}

/// A constructed gate with its shared state.
pub enum Gate {
    Recovery,
    Compression,
    VerboseLogging,
    Statsd(Arc<StatsdClient>),
    Prometheus(Arc<PrometheusGate>),
    Apm(Arc<ApmGate>),
    Cors,
    Auth(Arc<AuthGate>),
    GroupClaim(Arc<GroupClaimGate>),
    Static(Arc<StaticFiles>),
    Profiling(Arc<Profiler>),
    StripPrefix(String),
}

impl Gate {
    pub fn stage(&self) -> Stage {
        match self {
            Gate::Recovery => Stage::Recovery,
            Gate::Compression => Stage::Compression,
            Gate::VerboseLogging => Stage::VerboseLogging,
            Gate::Statsd(_) => Stage::Statsd,
            Gate::Prometheus(_) => Stage::Prometheus,
            Gate::Apm(_) => Stage::Apm,
            Gate::Cors => Stage::Cors,
            Gate::Auth(_) => Stage::Auth,
            Gate::GroupClaim(_) => Stage::GroupClaim,
            Gate::Static(_) => Stage::Static,
            Gate::Profiling(_) => Stage::Profiling,
            Gate::StripPrefix(_) => Stage::StripPrefix,
        }
    }

    fn apply(&self, router: Router) -> Router {
        match self {
            Gate::Recovery => router.layer(recovery_layer()),
            Gate::Compression => router.layer(CompressionLayer::new()),
            Gate::VerboseLogging => router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
            Gate::Statsd(client) => {
                router.layer(middleware::from_fn_with_state(client.clone(), statsd_gate))
            }
            Gate::Prometheus(gate) => {
                router.layer(middleware::from_fn_with_state(gate.clone(), prometheus_gate))
            }
            Gate::Apm(gate) => router.layer(middleware::from_fn_with_state(gate.clone(), apm_gate)),
            Gate::Cors => router.layer(cors_layer()),
            Gate::Auth(gate) => {
                router.layer(middleware::from_fn_with_state(gate.clone(), auth_gate))
            }
            Gate::GroupClaim(gate) => router.layer(middleware::from_fn_with_state(
                gate.clone(),
                group_claim_gate,
            )),
            Gate::Static(files) => {
                router.layer(middleware::from_fn_with_state(files.clone(), static_gate))
            }
            Gate::Profiling(profiler) => router.layer(middleware::from_fn_with_state(
                profiler.clone(),
                profiling_gate,
            )),
            // Requests outside the prefix fall through to the outer 404.
            Gate::StripPrefix(prefix) => Router::new().nest(prefix, router),
        }
    }
}

/// The assembled gate chain.
pub struct Pipeline {
    gates: Vec<Gate>,
}

impl Pipeline {
    /// Enabled stages, outermost first.
    pub fn stages(&self) -> Vec<Stage> {
        self.gates.iter().map(Gate::stage).collect()
    }

    /// Wrap `app` so the first gate is outermost.
    pub fn wrap(&self, app: Router) -> Router {
        self.gates
            .iter()
            .rev()
            .fold(app, |router, gate| gate.apply(router))
    }
}

/// Builds a [`Pipeline`] from configuration.
///
/// Collaborators that touch process-global or network state can be supplied
/// up front; otherwise they are created when their stage is enabled.
pub struct PipelineBuilder {
    config: Arc<Config>,
    metrics_handle: Option<PrometheusHandle>,
    statsd: Option<Arc<StatsdClient>>,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl PipelineBuilder {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            metrics_handle: None,
            statsd: None,
            verifier: None,
        }
    }

    /// Use an existing handle instead of installing the global recorder.
    pub fn metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn statsd(mut self, client: Arc<StatsdClient>) -> Self {
        self.statsd = Some(client);
        self
    }

    /// Use this verifier instead of a `JwtVerifier` over the configured key.
    pub fn verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Evaluate [`STAGES`] and construct the enabled gates.
    ///
    /// # Errors
    ///
    /// - `StartupError::KeyMaterial` - RS256 key did not parse
    /// - `StartupError::InvalidHeaderValue` - redirect URL unusable in headers
    /// - `StartupError::MetricsRecorder` - Prometheus recorder install failed
    /// - `StartupError::Statsd` - statsd socket could not be set up
    pub fn build(self) -> Result<Pipeline, StartupError> {
        let PipelineBuilder {
            config,
            mut metrics_handle,
            mut statsd,
            mut verifier,
        } = self;

        let stages = enabled_stages(&config);

        if stages.contains(&Stage::GroupClaim) && !stages.contains(&Stage::Auth) {
            tracing::warn!(
                target: "edge.pipeline",
                "JWT_AUTH_REQUIRE_GROUP_CLAIM is set but JWT_AUTH_ENABLED is false; every request will be rejected"
            );
        }

        let mut responder: Option<Arc<ErrorResponder>> = None;
        let mut gates = Vec::with_capacity(stages.len());

        for stage in &stages {
            let gate = match stage {
                Stage::Recovery => Gate::Recovery,
                Stage::Compression => Gate::Compression,
                Stage::VerboseLogging => Gate::VerboseLogging,
                Stage::Statsd => {
                    let client = match statsd.take() {
                        Some(client) => client,
                        None => Arc::new(StatsdClient::connect(
                            &config.statsd.host,
                            config.statsd.port,
                            &config.statsd.prefix,
                        )?),
                    };
                    Gate::Statsd(client)
                }
                Stage::Prometheus => {
                    let handle = match metrics_handle.take() {
                        Some(handle) => handle,
                        None => init_metrics_recorder().map_err(StartupError::MetricsRecorder)?,
                    };
                    Gate::Prometheus(Arc::new(PrometheusGate::new(
                        handle,
                        config.prometheus.path.clone(),
                        config.prometheus.include_latency_histogram,
                    )))
                }
                Stage::Apm => Gate::Apm(Arc::new(ApmGate::new(apm_service_name(&config)))),
                Stage::Cors => Gate::Cors,
                Stage::Auth => {
                    let verifier = match verifier.take() {
                        Some(verifier) => verifier,
                        None => build_verifier(&config)?,
                    };
                    let responder = shared_responder(&mut responder, &config)?;
                    Gate::Auth(Arc::new(AuthGate::new(&config, verifier, responder)))
                }
                Stage::GroupClaim => {
                    let responder = shared_responder(&mut responder, &config)?;
                    Gate::GroupClaim(Arc::new(GroupClaimGate::new(
                        config.jwt.require_group_claim.clone(),
                        responder,
                    )))
                }
                Stage::Static => Gate::Static(Arc::new(StaticFiles::new(
                    config.web_static_dir.clone(),
                    config.web_prefix.clone(),
                ))),
                Stage::Profiling => Gate::Profiling(Arc::new(Profiler::new())),
                Stage::StripPrefix => Gate::StripPrefix(config.web_prefix.clone()),
            };
            gates.push(gate);
        }

        let names: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
        tracing::info!(target: "edge.pipeline", stages = ?names, "Pipeline assembled");

        Ok(Pipeline { gates })
    }
}

/// Resolve the key once and fail fast when it is unusable.
fn build_verifier(config: &Config) -> Result<Arc<dyn TokenVerifier>, StartupError> {
    let jwt = &config.jwt;

    if jwt.signing_method == SigningMethod::Hs256 && jwt.secret.expose_secret().is_empty() {
        tracing::warn!(
            target: "edge.pipeline",
            "JWT_AUTH_SECRET is empty; HS256 tokens will not verify"
        );
    }

    let keys = Arc::new(KeyMaterial::resolve(jwt.signing_method, &jwt.secret));
    keys.ensure_usable()?;

    tracing::info!(
        target: "edge.pipeline",
        signing_method = jwt.signing_method.as_str(),
        clock_skew_seconds = jwt.clock_skew_seconds,
        "Token verifier ready"
    );

    Ok(Arc::new(JwtVerifier::new(
        keys,
        jwt.clock_skew_seconds,
        jwt.debug,
    )))
}

fn shared_responder(
    cache: &mut Option<Arc<ErrorResponder>>,
    config: &Config,
) -> Result<Arc<ErrorResponder>, StartupError> {
    if let Some(responder) = cache {
        return Ok(responder.clone());
    }
    let responder = Arc::new(ErrorResponder::from_config(&config.jwt)?);
    *cache = Some(responder.clone());
    Ok(responder)
}

fn apm_service_name(config: &Config) -> String {
    ApmTracer::from_config(config)
        .map(|tracer| tracer.service_name().to_string())
        .unwrap_or_else(|| config.new_relic_app_name.clone())
}
