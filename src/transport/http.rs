//! JSON-RPC over HTTP, served with hyper.
//!
//! Routes:
//!
//! - `POST /mcp` - one JSON-RPC message per request
//! - `OPTIONS /mcp` - CORS preflight
//! - `GET /health` - liveness check, `{"status":"ok"}`

use crate::Result;
use crate::protocol::{Message, PARSE_ERROR};
use crate::server::McpServer;
use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE, HeaderValue,
};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming as IncomingBody;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long open connections get to finish after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Bind `addr` and serve until `cancel` fires.
pub async fn serve_http(
    server: Arc<McpServer>,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_listener(server, listener, cancel).await
}

/// Serve on an already bound listener until `cancel` fires, then drain
/// open connections.
pub async fn serve_listener(
    server: Arc<McpServer>,
    listener: TcpListener,
    cancel: CancellationToken,
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!(transport = "http", addr = %local_addr, "MCP HTTP server listening");

    let graceful = GracefulShutdown::new();

    loop {
        let (stream, peer) = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            },
        };

        let io = TokioIo::new(stream);
        let server = server.clone();
        let cancel = cancel.clone();
        let service = service_fn(move |req: Request<IncomingBody>| {
            let server = server.clone();
            let cancel = cancel.child_token();
            async move { Ok::<_, Infallible>(handle_request(req, &server, &cancel).await) }
        });

        let connection = graceful.watch(http1::Builder::new().serve_connection(io, service));
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!(peer = %peer, error = %err, "Error serving connection");
            }
        });
    }

    drop(listener);
    info!("Shutting down HTTP server...");
    tokio::select! {
        _ = graceful.shutdown() => debug!("All connections closed"),
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => warn!("Timed out waiting for connections to close"),
    }
    Ok(())
}

/// Route one request.
async fn handle_request(
    req: Request<IncomingBody>,
    server: &McpServer,
    cancel: &CancellationToken,
) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    match path.as_str() {
        "/mcp" => {
            let mut response = handle_mcp(req, server, cancel).await;
            let headers = response.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type"),
            );
            response
        }
        "/health" if *req.method() == Method::GET => {
            json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
        }
        "/health" => text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        _ => text_response(StatusCode::NOT_FOUND, "Not found"),
    }
}

async fn handle_mcp(
    req: Request<IncomingBody>,
    server: &McpServer,
    cancel: &CancellationToken,
) -> Response<Full<Bytes>> {
    match *req.method() {
        Method::OPTIONS => return empty_response(StatusCode::OK),
        Method::POST => {}
        _ => return text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let error = Message::error_response(None, PARSE_ERROR, format!("invalid JSON: {}", e));
            return json_response(StatusCode::BAD_REQUEST, &error);
        }
    };

    let message = match serde_json::from_slice::<Message>(&body) {
        Ok(message) => message,
        Err(e) => {
            let error = Message::error_response(None, PARSE_ERROR, format!("invalid JSON: {}", e));
            return json_response(StatusCode::BAD_REQUEST, &error);
        }
    };

    match server.handle_message(message, cancel).await {
        Some(response) => json_response(StatusCode::OK, &response),
        None => empty_response(StatusCode::ACCEPTED),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(encoded) => {
            let mut response = Response::new(Full::new(Bytes::from(encoded)));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            warn!(error = %e, "Failed to encode response");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
