//! Integration tests for layered configuration loading

use incidentio_config::{
    ConfigError, ENV_PREFIX, EnvLoader, McpConfig, TransportKind, Validate,
};
use std::collections::HashMap;
use std::io::Write;

fn env(vars: &[(&str, &str)]) -> EnvLoader {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvLoader::from_map(Some(ENV_PREFIX.to_string()), vars)
}

fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file_partial_sections_keep_defaults() {
    let file = write_file(
        ".toml",
        r#"
            [api]
            api_key = "from-file"

            [retry]
            max_retries = 7

            [server]
            transport = "http"
            port = 3000
        "#,
    );

    let config = McpConfig::load_with(Some(file.path()), &env(&[])).unwrap();

    assert_eq!(config.api.api_key, "from-file");
    assert_eq!(config.api.base_url, "https://api.incident.io/v2");
    assert_eq!(config.retry.max_retries, 7);
    assert_eq!(config.retry.multiplier, 2.0);
    assert_eq!(config.server.transport, TransportKind::Http);
    assert_eq!(config.server.port, 3000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_json_file_then_env_wins() {
    let file = write_file(
        ".json",
        r#"{"rate_limit": {"max_tokens": 20.0, "refill_rate": 2.0}, "server": {"port": 3000}}"#,
    );

    let config = McpConfig::load_with(
        Some(file.path()),
        &env(&[
            ("MCP_PORT", "4000"),
            ("INCIDENTIO_MCP_RATE_LIMIT_REFILL_RATE", "4.5"),
        ]),
    )
    .unwrap();

    assert_eq!(config.server.port, 4000);
    assert_eq!(config.rate_limit.max_tokens, 20.0);
    assert_eq!(config.rate_limit.refill_rate, 4.5);
}

#[test]
fn test_unknown_extension_rejected() {
    let file = write_file(".yaml", "api: {}");
    let err = McpConfig::load_with(Some(file.path()), &env(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
fn test_wrong_types_in_file_rejected() {
    let file = write_file(".toml", "[server]\nport = \"not a number\"\n");
    let err = McpConfig::load_with(Some(file.path()), &env(&[])).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_missing_file_rejected() {
    let err = McpConfig::from_file(std::path::Path::new("/nonexistent/mcp.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
fn test_env_only_configuration() {
    let config = McpConfig::load_with(None, &env(&[("INCIDENT_IO_API_KEY", "env-key")])).unwrap();
    assert_eq!(config.api.api_key, "env-key");
    assert!(config.validate().is_ok());
}
