//! Configuration for the incident.io MCP server.
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML or JSON file ([`ConfigLoader`])
//! 3. a `.env` file ([`load_dotenv`]), which only fills unset variables
//! 4. environment variables ([`EnvLoader`])
//! 5. command-line flags, applied by the binary
//!
//! ```rust,no_run
//! use incidentio_config::{McpConfig, Validate};
//!
//! incidentio_config::load_dotenv(None)?;
//! let config = McpConfig::load(None)?;
//! config.validate()?;
//! # Ok::<(), incidentio_config::ConfigError>(())
//! ```

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{EnvLoader, load_dotenv};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{
    ApiSettings, CacheSettings, CircuitBreakerSettings, DEFAULT_MAX_RESPONSE_SIZE, ENV_PREFIX,
    MAX_CACHE_TTL_SECS, McpConfig, RateLimitSettings, RetrySettings, ServerSettings, TransportKind,
};
pub use validation::{ConfigValidator, Validate};
