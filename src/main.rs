//! `incidentio-mcp` - serve the incident.io API to MCP clients.
//!
//! Configuration is layered: built-in defaults, an optional TOML/JSON file,
//! `.env`, the process environment, then the flags below.

use clap::Parser;
use incidentio_config::{McpConfig, TransportKind, Validate, load_dotenv};
use incidentio_log::{Level, LogConfig};
use incidentio_mcp::{ServerError, app};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// MCP server for the incident.io API
#[derive(Debug, Parser)]
#[command(name = "incidentio-mcp")]
#[command(version)]
#[command(about = "Model Context Protocol server for the incident.io API")]
#[command(long_about = None)]
struct Cli {
    /// Transport to serve on (stdio or http)
    #[arg(short, long, value_parser = parse_transport)]
    transport: Option<TransportKind>,

    /// Port for the HTTP transport
    #[arg(short, long)]
    port: Option<u16>,

    /// Configuration file (.toml or .json)
    #[arg(short, long, env = "INCIDENTIO_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, value_parser = parse_level)]
    log_level: Option<Level>,
}

fn parse_transport(s: &str) -> Result<TransportKind, String> {
    s.parse()
}

fn parse_level(s: &str) -> Result<Level, String> {
    Level::parse(s).ok_or_else(|| format!("unknown log level: {}", s))
}

impl Cli {
    fn apply(&self, config: &mut McpConfig) {
        if let Some(transport) = self.transport {
            config.server.transport = transport;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = load_dotenv(None) {
        eprintln!("Warning: failed to load .env: {}", e);
    }

    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(level);
    }
    if let Err(e) = incidentio_log::init(&log_config) {
        eprintln!("Error: {}", ServerError::Logging(e.to_string()));
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> incidentio_mcp::Result<()> {
    let mut config = McpConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    app::run(config, cancel).await
}

/// Cancel `cancel` on SIGINT or SIGTERM.
async fn shutdown_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "Shutdown signal received"),
        _ = terminate => info!(signal = "SIGTERM", "Shutdown signal received"),
    }
    cancel.cancel();
}
