//! Transports carrying JSON-RPC messages to the [`McpServer`](crate::McpServer).

pub mod http;
pub mod stdio;

pub use self::http::{serve_http, serve_listener};
pub use self::stdio::{serve_lines, serve_stdio};
