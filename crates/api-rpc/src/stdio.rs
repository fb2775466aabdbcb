//! MCP stdio transport
//!
//! Newline-delimited JSON-RPC 2.0 over stdin/stdout. Requests are handled one
//! at a time in arrival order; the next line is not read until the current
//! response has been written.

use crate::handler::ToolRouter;
use crate::protocol::{
    internal_error, invalid_params, invalid_request, method_not_found, parse_error, success,
    JsonRpcRequest, JsonRpcResponse, DEFAULT_PROTOCOL_VERSION, JSONRPC_VERSION, SERVER_NAME,
};
use crate::types::CallToolRequest;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

pub struct McpStdioServer {
    router: Arc<ToolRouter>,
}

impl McpStdioServer {
    pub fn new(router: Arc<ToolRouter>) -> Self {
        Self { router }
    }

    /// Serve the process's own stdin/stdout until stdin closes
    pub async fn run(&self) -> io::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP stdio transport ready");
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            // Undecodable bytes are a parse error for that line only
            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.handle_line(trimmed).await
                }
                Err(err) => {
                    warn!(error = %err, "Input line is not valid UTF-8");
                    Some(parse_error())
                }
            };

            if let Some(response) = response {
                let mut text = serde_json::to_string(&response)?;
                text.push('\n');
                writer.write_all(text.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, MCP stdio transport stopping");
        Ok(())
    }

    /// One raw line in, at most one response out
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "Failed to parse JSON payload");
                return Some(parse_error());
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Invalid JSON-RPC request");
                return Some(invalid_request(value.get("id").cloned(), "invalid request"));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(invalid_request(request.id, "jsonrpc version must be 2.0"));
        }

        self.handle_request(request).await
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };
        let params = request.params.unwrap_or_else(|| json!({}));

        let response = match request.method.as_str() {
            "initialize" => {
                let version = params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_PROTOCOL_VERSION);
                info!(protocol_version = %version, "Client initialized");
                success(
                    id,
                    json!({
                        "protocolVersion": version,
                        "capabilities": { "tools": {} },
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION"),
                        }
                    }),
                )
            }
            "ping" => success(id, json!({})),
            "tools/list" => success(id, json!({ "tools": self.router.tools() })),
            "tools/call" => match serde_json::from_value::<CallToolRequest>(params) {
                Ok(call) => {
                    let result = self.router.call(&call.name, call.arguments).await;
                    match serde_json::to_value(result) {
                        Ok(value) => success(id, value),
                        Err(err) => internal_error(Some(id), err.to_string()),
                    }
                }
                Err(err) => invalid_params(Some(id), format!("invalid tools/call params: {err}")),
            },
            other => method_not_found(Some(id), other),
        };

        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ERROR_INVALID_REQUEST, ERROR_METHOD_NOT_FOUND, ERROR_PARSE};
    use crate::test_support::setup;
    use chrono::Utc;

    fn server() -> (crate::test_support::Fixture, McpStdioServer) {
        let fixture = setup();
        let server = McpStdioServer::new(fixture.router.clone());
        (fixture, server)
    }

    fn to_value(response: Option<JsonRpcResponse>) -> Value {
        serde_json::to_value(response.expect("response expected")).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let (_f, server) = server();
        let response = to_value(
            server
                .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#)
                .await,
        );

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(response["result"]["serverInfo"]["name"], "snapbridge");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let (_f, server) = server();
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (_f, server) = server();

        let parse = to_value(server.handle_line("{not json").await);
        assert_eq!(parse["error"]["code"], ERROR_PARSE);

        let invalid = to_value(server.handle_line(r#"{"id":7,"method":42}"#).await);
        assert_eq!(invalid["error"]["code"], ERROR_INVALID_REQUEST);
        assert_eq!(invalid["id"], 7);

        let unknown = to_value(
            server
                .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
                .await,
        );
        assert_eq!(unknown["error"]["code"], ERROR_METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list_and_call() {
        let (f, server) = server();
        f.store.add("ShipScreen_auto.png", vec![1, 2, 3], Utc::now());

        let list = to_value(
            server
                .handle_line(r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#)
                .await,
        );
        assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 12);
        assert!(list["result"]["tools"][0]["inputSchema"].is_object());

        let call = to_value(
            server
                .handle_line(r#"{"jsonrpc":"2.0","id":"b","method":"tools/call","params":{"name":"get_screenshot","arguments":{"filename":"ShipScreen_auto.png"}}}"#)
                .await,
        );
        assert_eq!(call["id"], "b");
        assert_eq!(call["result"]["isError"], false);
        assert_eq!(call["result"]["content"][1]["mimeType"], "image/png");
        assert_eq!(call["result"]["content"][1]["data"], "AQID");
    }

    #[tokio::test]
    async fn test_tool_failure_is_a_result_not_an_error() {
        let (_f, server) = server();
        let call = to_value(
            server
                .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#)
                .await,
        );
        assert!(call.get("error").is_none());
        assert_eq!(call["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_serve_processes_lines_in_order() {
        let (_f, server) = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"stop_app"}}"#,
            "\n"
        );
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(
            responses[1]["result"]["content"][0]["text"],
            "No app process running."
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_serving() {
        let (_f, server) = server();
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');
        let mut output = Vec::new();

        server.serve(input.as_slice(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], ERROR_PARSE);
        assert_eq!(responses[2]["id"], 2);
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let (_f, server) = server();
        let input = r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#;
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let response: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(response["id"], 9);
    }
}
