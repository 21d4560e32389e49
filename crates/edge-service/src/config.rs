//! Edge service configuration.
//!
//! Configuration is loaded once from environment variables and is immutable
//! afterwards; it is shared as `Arc<Config>` with every gate. The JWT secret is
//! redacted in Debug output.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `BIND_ADDRESS` | `0.0.0.0:18000` |
//! | `SHUTDOWN_DRAIN_SECONDS` | `0` |
//! | `MIDDLEWARE_GZIP_ENABLED` | `true` |
//! | `MIDDLEWARE_VERBOSE_LOGGER_ENABLED` | `true` |
//! | `STATSD_ENABLED` / `STATSD_HOST` / `STATSD_PORT` / `STATSD_PREFIX` | `false` / `127.0.0.1` / `8125` / `edge.` |
//! | `STATSD_APM_ENABLED` / `STATSD_APM_PORT` / `STATSD_APM_SERVICE_NAME` | `false` / `8126` / `edge` |
//! | `PROMETHEUS_ENABLED` / `PROMETHEUS_PATH` / `PROMETHEUS_INCLUDE_LATENCY_HISTOGRAM` | `false` / `/metrics` / `false` |
//! | `NEW_RELIC_ENABLED` / `NEW_RELIC_APP_NAME` | `false` / `edge` |
//! | `CORS_ENABLED` | `true` |
//! | `JWT_AUTH_ENABLED` / `JWT_AUTH_DEBUG` | `false` / `false` |
//! | `JWT_AUTH_SIGNING_METHOD` / `JWT_AUTH_SECRET` | `HS256` / empty |
//! | `JWT_AUTH_PREFIX_WHITELIST_PATHS` | `/api/v1/health` |
//! | `JWT_AUTH_EXACT_WHITELIST_PATHS` | empty |
//! | `JWT_AUTH_COOKIE_TOKEN_NAME` | `access_token` |
//! | `JWT_AUTH_USER_PROPERTY` | `user` |
//! | `JWT_AUTH_NO_TOKEN_STATUS_CODE` | `307` |
//! | `JWT_AUTH_NO_TOKEN_REDIRECT_URL` | `http://localhost:18000/login` |
//! | `JWT_AUTH_REQUIRE_GROUP_CLAIM` | empty (group gate disabled) |
//! | `JWT_AUTH_CLOCK_SKEW_SECONDS` | `0` |
//! | `WEB_PREFIX` / `WEB_STATIC_DIR` | empty / `./browser/dist` |
//! | `PPROF_ENABLED` | `false` |

use crate::auth::keys::SigningMethod;
use axum::http::StatusCode;
use common::config::{bool_or, int_or, list_or, string_or, EnvValueError};
use common::jwt::MAX_CLOCK_SKEW;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:18000";

/// Default Prometheus scrape path.
pub const DEFAULT_PROMETHEUS_PATH: &str = "/metrics";

/// Default no-token status code (temporary redirect).
pub const DEFAULT_NO_TOKEN_STATUS_CODE: u16 = 307;

/// Default redirect target / challenge realm.
pub const DEFAULT_NO_TOKEN_REDIRECT_URL: &str = "http://localhost:18000/login";

/// Default cookie checked before the Authorization header.
pub const DEFAULT_COOKIE_TOKEN_NAME: &str = "access_token";

/// Default prefix whitelist.
pub const DEFAULT_PREFIX_WHITELIST_PATHS: &[&str] = &["/api/v1/health"];

/// Keys the `/api/v1/me` response already uses for admission flags.
pub const RESERVED_USER_PROPERTIES: &[&str] = &["whitelisted", "authenticated"];

/// Behavior when a request is rejected by the auth gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoTokenBehavior {
    /// Answer `401` with a `WWW-Authenticate: Bearer` challenge.
    Challenge,
    /// Redirect with the given 3xx status.
    Redirect(StatusCode),
}

impl NoTokenBehavior {
    /// Map a configured status code to a behavior.
    ///
    /// Accepts `401` and the redirect statuses 301, 302, 303, 307 and 308.
    pub fn from_status(code: u16) -> Option<Self> {
        match code {
            401 => Some(Self::Challenge),
            301 | 302 | 303 | 307 | 308 => StatusCode::from_u16(code).ok().map(Self::Redirect),
            _ => None,
        }
    }

    /// The HTTP status this behavior answers with.
    pub fn status(self) -> StatusCode {
        match self {
            Self::Challenge => StatusCode::UNAUTHORIZED,
            Self::Redirect(status) => status,
        }
    }

    /// Exact whitelist rules only apply when clients handle the 401 themselves.
    pub fn allows_exact_whitelist(self) -> bool {
        matches!(self, Self::Challenge)
    }
}

/// JWT authentication settings.
#[derive(Clone)]
pub struct JwtAuthConfig {
    pub enabled: bool,
    pub debug: bool,
    pub signing_method: SigningMethod,
    /// HS256 shared secret or RS256 public key PEM.
    pub secret: SecretString,
    pub prefix_whitelist_paths: Vec<String>,
    pub exact_whitelist_paths: Vec<String>,
    pub cookie_token_name: String,
    pub user_property: String,
    pub no_token_behavior: NoTokenBehavior,
    /// Redirect target, also used as the challenge realm.
    pub no_token_redirect_url: String,
    /// Empty disables the group claim gate.
    pub require_group_claim: String,
    pub clock_skew_seconds: u64,
}

impl fmt::Debug for JwtAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthConfig")
            .field("enabled", &self.enabled)
            .field("debug", &self.debug)
            .field("signing_method", &self.signing_method)
            .field("secret", &"[REDACTED]")
            .field("prefix_whitelist_paths", &self.prefix_whitelist_paths)
            .field("exact_whitelist_paths", &self.exact_whitelist_paths)
            .field("cookie_token_name", &self.cookie_token_name)
            .field("user_property", &self.user_property)
            .field("no_token_behavior", &self.no_token_behavior)
            .field("no_token_redirect_url", &self.no_token_redirect_url)
            .field("require_group_claim", &self.require_group_claim)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish()
    }
}

/// Statsd metrics and APM tracer settings.
#[derive(Debug, Clone)]
pub struct StatsdConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub prefix: String,
    pub apm_enabled: bool,
    pub apm_port: u16,
    pub apm_service_name: String,
}

/// Prometheus settings.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    pub enabled: bool,
    /// Scrape path, served directly and never observed.
    pub path: String,
    pub include_latency_histogram: bool,
}

/// Edge service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:18000").
    pub bind_address: String,

    /// Seconds to wait after a shutdown signal before closing.
    pub shutdown_drain_seconds: u64,

    pub gzip_enabled: bool,
    pub verbose_logger_enabled: bool,
    pub statsd: StatsdConfig,
    pub prometheus: PrometheusConfig,
    pub new_relic_enabled: bool,
    pub new_relic_app_name: String,
    pub cors_enabled: bool,
    pub jwt: JwtAuthConfig,

    /// Base path stripped before whitelist matching and app dispatch.
    pub web_prefix: String,

    /// Directory served by the static gate.
    pub web_static_dir: PathBuf,

    pub pprof_enabled: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidValue(#[from] EnvValueError),

    #[error("Invalid JWT_AUTH_NO_TOKEN_STATUS_CODE: {0}")]
    InvalidNoTokenStatusCode(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid JWT_AUTH_NO_TOKEN_REDIRECT_URL: {0}")]
    InvalidRedirectUrl(String),

    #[error("Invalid JWT_AUTH_USER_PROPERTY: {0}")]
    InvalidUserProperty(String),

    #[error("Invalid PROMETHEUS_PATH: {0}")]
    InvalidPrometheusPath(String),

    #[error("Invalid WEB_PREFIX: {0}")]
    InvalidWebPrefix(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = string_or(vars, "BIND_ADDRESS", DEFAULT_BIND_ADDRESS);
        let shutdown_drain_seconds = int_or(vars, "SHUTDOWN_DRAIN_SECONDS", 0u64)?;

        let statsd = StatsdConfig {
            enabled: bool_or(vars, "STATSD_ENABLED", false)?,
            host: string_or(vars, "STATSD_HOST", "127.0.0.1"),
            port: int_or(vars, "STATSD_PORT", 8125u16)?,
            prefix: string_or(vars, "STATSD_PREFIX", "edge."),
            apm_enabled: bool_or(vars, "STATSD_APM_ENABLED", false)?,
            apm_port: int_or(vars, "STATSD_APM_PORT", 8126u16)?,
            apm_service_name: string_or(vars, "STATSD_APM_SERVICE_NAME", "edge"),
        };

        let prometheus = PrometheusConfig {
            enabled: bool_or(vars, "PROMETHEUS_ENABLED", false)?,
            path: string_or(vars, "PROMETHEUS_PATH", DEFAULT_PROMETHEUS_PATH),
            include_latency_histogram: bool_or(vars, "PROMETHEUS_INCLUDE_LATENCY_HISTOGRAM", false)?,
        };
        if !prometheus.path.starts_with('/') {
            return Err(ConfigError::InvalidPrometheusPath(format!(
                "PROMETHEUS_PATH must start with '/', got '{}'",
                prometheus.path
            )));
        }

        let jwt = Self::jwt_from_vars(vars)?;

        let web_prefix = string_or(vars, "WEB_PREFIX", "");
        if !web_prefix.is_empty() && (!web_prefix.starts_with('/') || web_prefix.ends_with('/')) {
            return Err(ConfigError::InvalidWebPrefix(format!(
                "WEB_PREFIX must start with '/' and not end with '/', got '{web_prefix}'"
            )));
        }

        Ok(Config {
            bind_address,
            shutdown_drain_seconds,
            gzip_enabled: bool_or(vars, "MIDDLEWARE_GZIP_ENABLED", true)?,
            verbose_logger_enabled: bool_or(vars, "MIDDLEWARE_VERBOSE_LOGGER_ENABLED", true)?,
            statsd,
            prometheus,
            new_relic_enabled: bool_or(vars, "NEW_RELIC_ENABLED", false)?,
            new_relic_app_name: string_or(vars, "NEW_RELIC_APP_NAME", "edge"),
            cors_enabled: bool_or(vars, "CORS_ENABLED", true)?,
            jwt,
            web_prefix,
            web_static_dir: PathBuf::from(string_or(vars, "WEB_STATIC_DIR", "./browser/dist")),
            pprof_enabled: bool_or(vars, "PPROF_ENABLED", false)?,
        })
    }

    fn jwt_from_vars(vars: &HashMap<String, String>) -> Result<JwtAuthConfig, ConfigError> {
        let enabled = bool_or(vars, "JWT_AUTH_ENABLED", false)?;

        let signing_method_raw = string_or(vars, "JWT_AUTH_SIGNING_METHOD", "HS256");
        let signing_method = SigningMethod::parse(&signing_method_raw);

        let status_code = int_or(
            vars,
            "JWT_AUTH_NO_TOKEN_STATUS_CODE",
            DEFAULT_NO_TOKEN_STATUS_CODE,
        )?;
        let no_token_behavior = NoTokenBehavior::from_status(status_code).ok_or_else(|| {
            ConfigError::InvalidNoTokenStatusCode(format!(
                "must be 401 or a redirect status (301, 302, 303, 307, 308), got {status_code}"
            ))
        })?;

        let no_token_redirect_url = string_or(
            vars,
            "JWT_AUTH_NO_TOKEN_REDIRECT_URL",
            DEFAULT_NO_TOKEN_REDIRECT_URL,
        );
        if no_token_redirect_url.chars().any(|c| c.is_control() || c == '"') {
            return Err(ConfigError::InvalidRedirectUrl(
                "must not contain control characters or quotes".to_string(),
            ));
        }
        if enabled
            && matches!(no_token_behavior, NoTokenBehavior::Redirect(_))
            && no_token_redirect_url.is_empty()
        {
            return Err(ConfigError::InvalidRedirectUrl(
                "must be set when JWT_AUTH_NO_TOKEN_STATUS_CODE is a redirect".to_string(),
            ));
        }

        let user_property = string_or(vars, "JWT_AUTH_USER_PROPERTY", "user");
        if user_property.is_empty() || RESERVED_USER_PROPERTIES.contains(&user_property.as_str()) {
            return Err(ConfigError::InvalidUserProperty(format!(
                "must be non-empty and not one of {RESERVED_USER_PROPERTIES:?}, got '{user_property}'"
            )));
        }

        let clock_skew_seconds = int_or(vars, "JWT_AUTH_CLOCK_SKEW_SECONDS", 0u64)?;
        if clock_skew_seconds > MAX_CLOCK_SKEW.as_secs() {
            return Err(ConfigError::InvalidJwtClockSkew(format!(
                "JWT_AUTH_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                MAX_CLOCK_SKEW.as_secs(),
                clock_skew_seconds
            )));
        }

        Ok(JwtAuthConfig {
            enabled,
            debug: bool_or(vars, "JWT_AUTH_DEBUG", false)?,
            signing_method,
            secret: SecretString::from(string_or(vars, "JWT_AUTH_SECRET", "")),
            prefix_whitelist_paths: list_or(
                vars,
                "JWT_AUTH_PREFIX_WHITELIST_PATHS",
                DEFAULT_PREFIX_WHITELIST_PATHS,
            ),
            exact_whitelist_paths: list_or(vars, "JWT_AUTH_EXACT_WHITELIST_PATHS", &[]),
            cookie_token_name: string_or(
                vars,
                "JWT_AUTH_COOKIE_TOKEN_NAME",
                DEFAULT_COOKIE_TOKEN_NAME,
            ),
            user_property,
            no_token_behavior,
            no_token_redirect_url,
            require_group_claim: string_or(vars, "JWT_AUTH_REQUIRE_GROUP_CLAIM", ""),
            clock_skew_seconds,
        })
    }

    /// True when the APM gate and tracer are configured.
    pub fn apm_enabled(&self) -> bool {
        self.new_relic_enabled || (self.statsd.enabled && self.statsd.apm_enabled)
    }
}
