// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable loader.
///
/// Reads the process environment by default; tests inject a lookup so they
/// never have to mutate global state. Empty values count as unset.
#[derive(Clone)]
pub struct EnvLoader {
    prefix: Option<String>,
    lookup: Lookup,
}

impl EnvLoader {
    /// Create a loader over the process environment
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix,
            lookup: Arc::new(|key| env::var(key).ok()),
        }
    }

    /// Create a loader over an arbitrary lookup function
    pub fn with_lookup<F>(prefix: Option<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            prefix,
            lookup: Arc::new(lookup),
        }
    }

    /// Create a loader over a fixed set of variables
    pub fn from_map(prefix: Option<String>, vars: HashMap<String, String>) -> Self {
        Self::with_lookup(prefix, move |key| vars.get(key).cloned())
    }

    /// The configured prefix, if any
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Look up a variable by its exact name
    pub fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    /// Look up `{PREFIX}_{KEY}`, or just `KEY` without a prefix
    pub fn prefixed(&self, key: &str) -> Option<String> {
        self.var(&self.full_key(key))
    }

    /// Parse a variable by its exact name
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.var(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidEnv {
                    name: name.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Parse `{PREFIX}_{KEY}`
    pub fn parse_prefixed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.parse(&self.full_key(key))
    }

    fn full_key(&self, key: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for EnvLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLoader")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Load a `.env` file into the process environment.
///
/// With no path, a missing `.env` in the working directory is not an error.
/// Variables already set in the environment are never overwritten.
pub fn load_dotenv(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        None => match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::LoadError(e.to_string())),
        },
    }
    Ok(())
}
