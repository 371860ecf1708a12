//! # incident.io MCP server
//!
//! A [Model Context Protocol](https://modelcontextprotocol.io) server that
//! exposes the incident.io API as tools an assistant can call.
//!
//! The crate is layered:
//!
//! - [`protocol`] - JSON-RPC 2.0 message types and MCP payloads
//! - [`tools`] - the [`Tool`](tools::Tool) trait, the registry and every incident.io tool
//! - [`server`] - transport-independent request dispatch
//! - [`transport`] - newline-delimited stdio and HTTP (`POST /mcp`) front ends
//! - [`app`] - wiring from [`McpConfig`](incidentio_config::McpConfig) to a running server
//!
//! Outbound calls go through the resilience pipeline in
//! `incidentio-http-client` (rate limiter, circuit breaker, retry, timeouts)
//! and the typed bindings in `incidentio-api`.
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use incidentio_config::McpConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> incidentio_mcp::Result<()> {
//!     let config = McpConfig::load(None)?;
//!     incidentio_mcp::app::run(config, CancellationToken::new()).await
//! }
//! ```

pub mod app;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use error::{Result, ServerError};
pub use server::McpServer;
pub use tools::{Tool, ToolRegistry};
