//! Typed settings for the MCP server and its resilience pipeline.

use crate::env::EnvLoader;
use crate::loader::ConfigLoader;
use crate::validation::{ConfigValidator, Validate};
use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Prefix for resilience overrides, e.g. `INCIDENTIO_MCP_RETRY_MAX_RETRIES`.
pub const ENV_PREFIX: &str = "INCIDENTIO_MCP";

pub const API_KEY_VAR: &str = "INCIDENT_IO_API_KEY";
pub const BASE_URL_VAR: &str = "INCIDENT_IO_BASE_URL";
pub const TRANSPORT_VAR: &str = "MCP_TRANSPORT";
pub const PORT_VAR: &str = "MCP_PORT";
pub const MAX_RESPONSE_SIZE_VAR: &str = "MCP_MAX_RESPONSE_SIZE";

/// Default maximum size of a tool response (50 KiB).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 50 * 1024;

/// Longest accepted cache TTL (one week).
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub api: ApiSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub circuit_breaker: CircuitBreakerSettings,
    pub retry: RetrySettings,
    pub server: ServerSettings,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub api_key: String,
    pub base_url: String,
    pub v1_base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.incident.io/v2".to_string(),
            v1_base_url: "https://api.incident.io/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ApiSettings")
            .field("api_key", &key)
            .field("base_url", &self.base_url)
            .field("v1_base_url", &self.v1_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_tokens: f64,
    pub refill_rate: f64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_tokens: 100.0,
            refill_rate: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub max_failures: u32,
    pub failure_threshold: f64,
    pub min_requests: u32,
    pub timeout_secs: u64,
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            failure_threshold: 0.5,
            min_requests: 10,
            timeout_secs: 30,
            half_open_max_requests: 3,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    pub retryable_status_codes: Vec<u16>,
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10_000,
            multiplier: 2.0,
            retryable_status_codes: vec![408, 429, 500, 502, 503, 504],
            jitter: 0.0,
        }
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Which transport the server speaks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(TransportKind::Stdio),
            "http" => Ok(TransportKind::Http),
            other => Err(format!("unknown transport '{}' (expected stdio or http)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    pub max_response_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            transport: TransportKind::Stdio,
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

impl McpConfig {
    /// Load defaults, then `file` (if any), then the process environment.
    ///
    /// Does not validate; call [`Validate::validate`] once CLI overrides
    /// have been applied.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with(file, &EnvLoader::new(Some(ENV_PREFIX.to_string())))
    }

    /// Like [`McpConfig::load`] with an explicit environment source.
    pub fn load_with(file: Option<&Path>, env: &EnvLoader) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    /// Read a TOML or JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        let config = serde_json::from_value(value).map_err(|e| {
            ConfigError::ParseError(format!("{}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Overlay environment variables onto this configuration.
    ///
    /// Unprefixed names are the ones the server has always honoured; the
    /// resilience knobs live under [`ENV_PREFIX`].
    pub fn apply_env(&mut self, env: &EnvLoader) -> Result<()> {
        if let Some(key) = env.var(API_KEY_VAR) {
            self.api.api_key = key.trim().to_string();
        }
        if let Some(url) = env.var(BASE_URL_VAR) {
            self.api.base_url = url.trim().to_string();
        }
        if let Some(transport) = env.parse(TRANSPORT_VAR)? {
            self.server.transport = transport;
        }
        if let Some(port) = env.parse(PORT_VAR)? {
            self.server.port = port;
        }
        if let Some(size) = env.parse::<usize>(MAX_RESPONSE_SIZE_VAR)? {
            // Non-positive sizes fall back to the current setting.
            if size > 0 {
                self.server.max_response_size = size;
            }
        }

        override_with(env, "V1_BASE_URL", &mut self.api.v1_base_url)?;
        override_with(env, "TIMEOUT_SECS", &mut self.api.timeout_secs)?;
        override_with(env, "CACHE_TTL_SECS", &mut self.cache.ttl_secs)?;
        override_with(env, "RATE_LIMIT_MAX_TOKENS", &mut self.rate_limit.max_tokens)?;
        override_with(env, "RATE_LIMIT_REFILL_RATE", &mut self.rate_limit.refill_rate)?;

        let breaker = &mut self.circuit_breaker;
        override_with(env, "CB_MAX_FAILURES", &mut breaker.max_failures)?;
        override_with(env, "CB_FAILURE_THRESHOLD", &mut breaker.failure_threshold)?;
        override_with(env, "CB_MIN_REQUESTS", &mut breaker.min_requests)?;
        override_with(env, "CB_TIMEOUT_SECS", &mut breaker.timeout_secs)?;
        override_with(env, "CB_HALF_OPEN_MAX_REQUESTS", &mut breaker.half_open_max_requests)?;

        let retry = &mut self.retry;
        override_with(env, "RETRY_MAX_RETRIES", &mut retry.max_retries)?;
        override_with(env, "RETRY_INITIAL_BACKOFF_MS", &mut retry.initial_backoff_ms)?;
        override_with(env, "RETRY_MAX_BACKOFF_MS", &mut retry.max_backoff_ms)?;
        override_with(env, "RETRY_MULTIPLIER", &mut retry.multiplier)?;
        override_with(env, "RETRY_JITTER", &mut retry.jitter)?;
        if let Some(raw) = env.prefixed("RETRY_STATUS_CODES") {
            retry.retryable_status_codes = parse_status_codes(&raw)?;
        }

        Ok(())
    }
}

fn override_with<T>(env: &EnvLoader, key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if let Some(value) = env.parse_prefixed(key)? {
        *slot = value;
    }
    Ok(())
}

fn parse_status_codes(raw: &str) -> Result<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse::<u16>().map_err(|e| ConfigError::InvalidEnv {
                name: format!("{}_RETRY_STATUS_CODES", ENV_PREFIX),
                value: raw.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl Validate for McpConfig {
    fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} environment variable is required",
                API_KEY_VAR
            )));
        }
        ConfigValidator::not_empty(&self.api.base_url, "api.base_url")?;
        ConfigValidator::is_url(&self.api.base_url, "api.base_url")?;
        ConfigValidator::is_url(&self.api.v1_base_url, "api.v1_base_url")?;
        ConfigValidator::at_least(self.api.timeout_secs, 1, "api.timeout_secs")?;

        ConfigValidator::at_most(self.cache.ttl_secs, MAX_CACHE_TTL_SECS, "cache.ttl_secs")?;

        ConfigValidator::finite(self.rate_limit.max_tokens, "rate_limit.max_tokens")?;
        ConfigValidator::at_least(self.rate_limit.max_tokens, 1.0, "rate_limit.max_tokens")?;
        ConfigValidator::positive(self.rate_limit.refill_rate, "rate_limit.refill_rate")?;

        let breaker = &self.circuit_breaker;
        ConfigValidator::at_least(breaker.max_failures, 1, "circuit_breaker.max_failures")?;
        if breaker.failure_threshold.is_nan() || breaker.failure_threshold <= 0.0 {
            return Err(ConfigError::ValidationError(
                "circuit_breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }
        ConfigValidator::at_least(
            breaker.half_open_max_requests,
            1,
            "circuit_breaker.half_open_max_requests",
        )?;

        let retry = &self.retry;
        ConfigValidator::finite(retry.multiplier, "retry.multiplier")?;
        ConfigValidator::at_least(retry.multiplier, 1.0, "retry.multiplier")?;
        if retry.max_backoff_ms < retry.initial_backoff_ms {
            return Err(ConfigError::ValidationError(
                "retry.max_backoff_ms must be at least retry.initial_backoff_ms".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&retry.jitter) {
            return Err(ConfigError::ValidationError(
                "retry.jitter must be between 0 and 1".to_string(),
            ));
        }

        if self.server.transport == TransportKind::Http {
            ConfigValidator::is_port(self.server.port, "server.port")?;
        }
        ConfigValidator::at_least(self.server.max_response_size, 1, "server.max_response_size")?;
        Ok(())
    }
}
