//! Newline-delimited JSON-RPC over stdin/stdout.

use crate::Result;
use crate::server::McpServer;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Serve on the process's stdin and stdout.
pub async fn serve_stdio(server: Arc<McpServer>, cancel: CancellationToken) -> Result<()> {
    serve_lines(server, tokio::io::stdin(), tokio::io::stdout(), cancel).await
}

/// Serve one JSON-RPC message per line from `reader`, writing responses to
/// `writer`.
///
/// Each request runs on its own task so slow tool calls do not block the
/// next line; responses are written by a single task in completion order.
/// Returns on end of input (after in-flight requests finish) or when
/// `cancel` fires.
pub async fn serve_lines<R, W>(
    server: Arc<McpServer>,
    reader: R,
    writer: W,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_responses(writer, rx));

    let mut lines = BufReader::new(reader).lines();
    let mut in_flight = JoinSet::new();

    info!(transport = "stdio", "MCP server started");
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Shutdown requested, stopping stdio transport");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            debug!("stdin closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let server = server.clone();
        let tx = tx.clone();
        let request_cancel = cancel.child_token();
        in_flight.spawn(async move {
            if let Some(response) = server.handle_raw(line.as_bytes(), &request_cancel).await {
                match serde_json::to_string(&response) {
                    Ok(encoded) => {
                        let _ = tx.send(encoded);
                    }
                    Err(e) => error!(error = %e, "Failed to encode response"),
                }
            }
        });

        // Reap finished requests so the set does not grow without bound.
        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}
    drop(tx);

    match writer_task.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Response writer task failed");
            Ok(())
        }
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Arguments, Tool, ToolError, ToolRegistry};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    struct Sleepy;

    #[async_trait]
    impl Tool for Sleepy {
        fn name(&self) -> &'static str {
            "sleepy"
        }

        fn description(&self) -> &'static str {
            "Sleeps for `ms` milliseconds"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(
            &self,
            args: &Arguments,
            cancel: &CancellationToken,
        ) -> std::result::Result<String, ToolError> {
            let ms = args.get("ms").and_then(Value::as_u64).unwrap_or(0);
            tokio::select! {
                _ = cancel.cancelled() => Err(ToolError::Message("cancelled".into())),
                _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(format!("slept {}", ms)),
            }
        }
    }

    fn server() -> Arc<McpServer> {
        let mut tools = ToolRegistry::new();
        tools.register(Sleepy);
        Arc::new(McpServer::new(tools))
    }

    async fn run(input: &str) -> Vec<Value> {
        let (output, mut read_back) = tokio::io::duplex(64 * 1024);
        serve_lines(server(), input.as_bytes(), output, CancellationToken::new())
            .await
            .unwrap();

        let mut out = String::new();
        read_back.read_to_string(&mut out).await.unwrap();
        out.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_responses_written_one_per_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );

        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        let ids: Vec<&Value> = responses.iter().map(|r| &r["id"]).collect();
        assert!(ids.contains(&&json!(1)));
        assert!(ids.contains(&&json!(2)));
    }

    #[tokio::test]
    async fn test_slow_call_does_not_block_later_requests() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":"slow","method":"tools/call","params":{"name":"sleepy","arguments":{"ms":200}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"fast","method":"ping"}"#,
            "\n",
        );

        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], "fast");
        assert_eq!(responses[1]["result"]["content"][0]["text"], "slept 200");
    }

    #[tokio::test]
    async fn test_invalid_line_gets_parse_error() {
        let responses = run("not json\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_cancel_stops_loop() {
        let (_client, server_side) = tokio::io::duplex(1024);
        let (reader, _writer) = tokio::io::split(server_side);
        let (output, _read_back) = tokio::io::duplex(1024);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(serve_lines(server(), reader, output, cancel.clone()));
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(result.is_ok());
    }
}
