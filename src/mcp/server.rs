//! Newline-delimited JSON-RPC server loop
//!
//! Reads one JSON-RPC message per line, answers requests in arrival order
//! and stays silent on notifications. Generic over the reader and writer so
//! tests can drive it through an in-memory pipe; production uses
//! stdin/stdout.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::mcp::types::{
    error_codes, negotiate_protocol_version, CallToolParams, Implementation, InitializeParams,
    InitializeResponse, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ReadResourceParams,
    ServerCapabilities, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_PING,
    METHOD_RESOURCES_LIST, METHOD_RESOURCES_READ, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};

const INSTRUCTIONS: &str = "Inspect Jenkins jobs, builds, console logs and the build queue, \
and trigger builds. Jobs inside folders are addressed as 'folder/job'.";

type RpcResult = std::result::Result<JsonValue, JsonRpcError>;

fn rpc_error(code: i64, message: impl Into<String>) -> JsonRpcError {
    JsonRpcError {
        code,
        message: message.into(),
        data: None,
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<JsonValue>) -> std::result::Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| rpc_error(error_codes::INVALID_PARAMS, "Missing params"))?;
    serde_json::from_value(params)
        .map_err(|e| rpc_error(error_codes::INVALID_PARAMS, format!("Invalid params: {}", e)))
}

fn to_result<T: serde::Serialize>(value: T) -> RpcResult {
    serde_json::to_value(value)
        .map_err(|e| rpc_error(error_codes::INTERNAL_ERROR, format!("Serialization failed: {}", e)))
}

/// MCP server bound to a dispatcher.
pub struct McpServer {
    dispatcher: Dispatcher,
    server_info: Implementation,
}

impl McpServer {
    /// Create a server advertising `name` and the crate version.
    pub fn new(dispatcher: Dispatcher, name: impl Into<String>) -> Self {
        Self {
            dispatcher,
            server_info: Implementation {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Serve until `reader` reaches EOF.
    ///
    /// Every response is written as a single line and flushed immediately.
    ///
    /// # Errors
    ///
    /// Returns an error only when reading or writing the underlying streams
    /// fails.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.server_info.name, "MCP server listening on stdio");
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut frame = serde_json::to_string(&response)?;
                frame.push('\n');
                writer.write_all(frame.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("Input closed, MCP server stopping");
        Ok(())
    }

    /// Handle one raw message; `None` means nothing is sent back.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: JsonValue = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unparseable JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    JsonValue::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let id = value.get("id").cloned();
        let null_id = id.as_ref().is_some_and(JsonValue::is_null);
        if value.get("method").is_none() && (value.get("result").is_some() || value.get("error").is_some()) {
            debug!("Ignoring JSON-RPC response from client");
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return id.map(|id| {
                    JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    )
                });
            }
        };

        if request.jsonrpc != "2.0" {
            return request.id.map(|id| {
                JsonRpcResponse::error(id, error_codes::INVALID_REQUEST, "jsonrpc must be \"2.0\"")
            });
        }

        if request.is_notification() {
            if null_id {
                debug!(method = %request.method, "Request with null id treated as a notification");
            } else if request.method == METHOD_INITIALIZED {
                info!("Client finished initialization");
            } else {
                debug!(method = %request.method, "Notification received");
            }
            return None;
        }
        let id = request.id.clone().unwrap_or_default();

        Some(match self.handle_request(request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(error),
            },
        })
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> RpcResult {
        debug!(method = %request.method, "Handling request");
        match request.method.as_str() {
            METHOD_INITIALIZE => {
                let params: InitializeParams = match request.params {
                    Some(p) => serde_json::from_value(p).map_err(|e| {
                        rpc_error(error_codes::INVALID_PARAMS, format!("Invalid params: {}", e))
                    })?,
                    None => InitializeParams::default(),
                };
                if let Some(client) = &params.client_info {
                    info!(client = %client.name, version = %client.version, "Client connected");
                }
                to_result(InitializeResponse {
                    protocol_version: negotiate_protocol_version(
                        params.protocol_version.as_deref(),
                    )
                    .to_string(),
                    capabilities: ServerCapabilities {
                        resources: Some(serde_json::json!({})),
                        tools: Some(serde_json::json!({})),
                    },
                    server_info: self.server_info.clone(),
                    instructions: Some(INSTRUCTIONS.to_string()),
                })
            }
            METHOD_PING => Ok(serde_json::json!({})),
            METHOD_TOOLS_LIST => to_result(self.dispatcher.list_tools()),
            METHOD_TOOLS_CALL => {
                let params: CallToolParams = parse_params(request.params)?;
                to_result(
                    self.dispatcher
                        .call_tool(&params.name, params.arguments.as_ref())
                        .await,
                )
            }
            METHOD_RESOURCES_LIST => to_result(self.dispatcher.list_resources()),
            METHOD_RESOURCES_READ => {
                let params: ReadResourceParams = parse_params(request.params)?;
                to_result(self.dispatcher.read_resource(&params.uri).await)
            }
            other => Err(rpc_error(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jenkins::MockJenkinsApi;
    use serde_json::json;
    use std::sync::Arc;

    fn server(mock: MockJenkinsApi) -> McpServer {
        McpServer::new(Dispatcher::new(Arc::new(mock)), "jenkins")
    }

    async fn call(server: &McpServer, message: JsonValue) -> JsonValue {
        let response = server
            .handle_message(&message.to_string())
            .await
            .expect("response expected");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_echoes_supported_version() {
        let s = server(MockJenkinsApi::new());
        let resp = call(
            &s,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                   "params": {"protocolVersion": "2024-11-05",
                              "clientInfo": {"name": "test", "version": "0.0.1"}}}),
        )
        .await;
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(resp["result"]["serverInfo"]["name"], "jenkins");
        assert!(resp["result"]["capabilities"]["tools"].is_object());
        assert!(resp["result"]["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let s = server(MockJenkinsApi::new());
        let resp = call(&s, json!({"jsonrpc": "2.0", "id": "a", "method": "ping"})).await;
        assert_eq!(resp["id"], "a");
        assert_eq!(resp["result"], json!({}));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let s = server(MockJenkinsApi::new());
        let msg = json!({"jsonrpc": "2.0", "method": METHOD_INITIALIZED});
        assert!(s.handle_message(&msg.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_null_id_is_not_answered() {
        let s = server(MockJenkinsApi::new());
        let msg = r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#;
        assert!(s.handle_message(msg).await.is_none());

        // A zero id is still a request
        let resp = call(&s, json!({"jsonrpc": "2.0", "id": 0, "method": "ping"})).await;
        assert_eq!(resp["id"], 0);
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let s = server(MockJenkinsApi::new());
        let resp = s.handle_message("{not json").await.unwrap();
        let val = serde_json::to_value(resp).unwrap();
        assert_eq!(val["id"], JsonValue::Null);
        assert_eq!(val["error"]["code"], error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let s = server(MockJenkinsApi::new());
        let resp = call(&s, json!({"jsonrpc": "2.0", "id": 3, "method": "prompts/list"})).await;
        assert_eq!(resp["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_without_params_is_invalid() {
        let s = server(MockJenkinsApi::new());
        let resp = call(&s, json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call"})).await;
        assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_list_and_resources_list() {
        let s = server(MockJenkinsApi::new());
        let resp = call(&s, json!({"jsonrpc": "2.0", "id": 5, "method": "tools/list"})).await;
        assert_eq!(resp["result"]["tools"].as_array().unwrap().len(), 9);

        let resp = call(&s, json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).await;
        assert_eq!(resp["result"]["resources"][0]["uri"], "jenkins://jobs");
        assert_eq!(resp["result"]["resources"][0]["mimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_tool_error_is_a_result_not_an_rpc_error() {
        let s = server(MockJenkinsApi::new());
        let resp = call(
            &s,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call",
                   "params": {"name": "get_job_info", "arguments": {}}}),
        )
        .await;
        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(resp["result"]["content"][0]["type"], "text");
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let s = server(MockJenkinsApi::new());
        let resp = call(&s, json!({"jsonrpc": "1.0", "id": 8, "method": "ping"})).await;
        assert_eq!(resp["error"]["code"], error_codes::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_client_responses_are_ignored() {
        let s = server(MockJenkinsApi::new());
        let msg = json!({"jsonrpc": "2.0", "id": 9, "result": {}});
        assert!(s.handle_message(&msg.to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_run_over_duplex() {
        let s = server(MockJenkinsApi::new());
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"nope\"}\n",
        );
        let mut output = Vec::new();
        s.run(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let frames: Vec<JsonValue> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["id"], 1);
        assert_eq!(frames[1]["error"]["code"], error_codes::METHOD_NOT_FOUND);
    }
}
