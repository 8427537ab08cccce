// MCP server: JSON-RPC dispatch plus the newline-delimited stdio transport

use crate::codec::{Frame, MessageCodec};
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
    DEFAULT_PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

const INSTRUCTIONS: &str = "Portfolio retrieval tools. Use query_sp500_portfolio for filtered \
company lists, get_company_details for one company, get_sector_analysis for sector-level \
comparisons and get_exposure_summary for portfolio-wide tariff exposure.";

#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, name: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(registry),
            info: ServerInfo {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        tracing::info!(
            "MCP server '{}' listening on stdio with {} tools",
            self.info.name,
            self.registry.len()
        );
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one JSON-RPC message per line from `reader`, replying on `writer`
    ///
    /// Malformed lines get a parse error reply; only transport I/O errors end
    /// the session.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = FramedRead::new(reader, MessageCodec::new());
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(frame) = frames.next().await {
            let reply = match frame.context("Failed to read from transport")? {
                Frame::Message(line) if line.trim().is_empty() => continue,
                Frame::Message(line) => self.handle_message(&line).await,
                Frame::InvalidUtf8 => {
                    tracing::warn!("Rejected message that is not valid UTF-8");
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::parse_error(),
                    ))
                }
                Frame::TooLong => {
                    tracing::warn!("Rejected message over the line length limit");
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::parse_error(),
                    ))
                }
            };

            if let Some(response) = reply {
                let encoded = serde_json::to_string(&response)?;
                sink.send(encoded)
                    .await
                    .context("Failed to write to transport")?;
            }
        }

        tracing::info!("Transport closed, shutting down");
        Ok(())
    }

    /// Handle one raw message; `None` for notifications
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!("Rejected unparseable message: {}", e);
                let error = if serde_json::from_str::<serde_json::Value>(raw).is_ok() {
                    JsonRpcError::invalid_request()
                } else {
                    JsonRpcError::parse_error()
                };
                Some(JsonRpcResponse::error(serde_json::Value::Null, error))
            }
        }
    }

    /// Dispatch a parsed request; `None` for notifications
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            tracing::debug!("Notification: {}", request.method);
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        tracing::debug!("Request {}: {}", id, request.method);

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => encode(&ListToolsResult {
                tools: self.registry.list_schemas(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: InitializeParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)))?,
            None => InitializeParams::default(),
        };

        if let Some(client) = &params.client_info {
            tracing::info!("Client connected: {} {}", client.name, client.version);
        }

        encode(&InitializeResult {
            protocol_version: params
                .protocol_version
                .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.info.clone(),
            instructions: Some(INSTRUCTIONS.to_string()),
        })
    }

    async fn call_tool(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| {
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e))
                })
            })?;

        let tool = self
            .registry
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        let result = tool.execute(params.arguments).await.map_err(|e| {
            tracing::error!("Tool {} failed: {:#}", params.name, e);
            JsonRpcError::internal_error(format!("Tool {} failed: {}", params.name, e))
        })?;

        encode(&result)
    }
}

fn encode(value: &impl Serialize) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::portfolio_registry;
    use serde_json::json;
    use tariffscope_core::{Portfolio, PortfolioEngine};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn server() -> McpServer {
        let engine = PortfolioEngine::new(Arc::new(Portfolio::embedded().unwrap()));
        McpServer::new(portfolio_registry(engine), "test-server")
    }

    fn request(id: i64, method: &str, params: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest::new(id, method, params)
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let response = server()
            .handle_request(request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "0.1"}
                }),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_tools_list_in_registration_order() {
        let response = server()
            .handle_request(request(2, "tools/list", json!({})))
            .await
            .unwrap();

        let tools = response.result.unwrap()["tools"].clone();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "query_sp500_portfolio",
                "get_company_details",
                "get_sector_analysis",
                "get_exposure_summary"
            ]
        );

        // Strict schema consumers reject union types
        let raw = tools.to_string();
        assert!(!raw.contains("anyOf") && !raw.contains("oneOf") && !raw.contains("allOf"));
    }

    #[tokio::test]
    async fn test_tools_call_dispatch() {
        let response = server()
            .handle_request(request(
                3,
                "tools/call",
                json!({"name": "get_company_details", "arguments": {"ticker": "APEX0"}}),
            ))
            .await
            .unwrap();

        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["structuredContent"]["company"]["ticker"], "APEX0");
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_is_result_not_rpc_error() {
        let response = server()
            .handle_request(request(
                4,
                "tools/call",
                json!({"name": "get_company_details", "arguments": {"ticker": "NOPE99"}}),
            ))
            .await
            .unwrap();

        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["status"], "not_found");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let server = server();

        let response = server
            .handle_request(request(5, "tools/call", json!({"name": "drop_tables"})))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);

        let response = server
            .handle_request(request(6, "resources/list", json!({})))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let response = server()
            .handle_request(JsonRpcRequest::notification("notifications/initialized"))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_notification_with_bad_version_gets_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc": "1.0", "method": "notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_malformed_messages() {
        let server = server();

        let response = server.handle_message("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
        assert!(response.id.is_null());

        let response = server.handle_message(r#"{"id": 1}"#).await.unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        let response = server
            .handle_message(r#"{"jsonrpc": "1.0", "id": 7, "method": "ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
        assert_eq!(response.id, 7);
    }

    #[tokio::test]
    async fn test_serve_over_duplex_stream() {
        let server = server();
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);

        let handle = tokio::spawn(async move { server.serve(server_read, server_write).await });

        let (client_read, mut client_write) = tokio::io::split(client);
        let messages = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "get_exposure_summary", "arguments": {}}}),
        ];
        for message in &messages {
            client_write
                .write_all(format!("{}\n\n", message).as_bytes())
                .await
                .unwrap();
        }
        client_write.shutdown().await.unwrap();

        let mut replies = BufReader::new(client_read).lines();
        let first: serde_json::Value =
            serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
        let second: serde_json::Value =
            serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();

        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert_eq!(
            second["result"]["structuredContent"]["portfolio_overview"]["total_companies"],
            60
        );

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8_line() {
        let server = server();
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);

        let handle = tokio::spawn(async move { server.serve(server_read, server_write).await });

        let (client_read, mut client_write) = tokio::io::split(client);
        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\",\"x\":\"\xff\"}\n")
            .await
            .unwrap();
        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n")
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();

        let mut replies = BufReader::new(client_read).lines();
        let first: serde_json::Value =
            serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();
        let second: serde_json::Value =
            serde_json::from_str(&replies.next_line().await.unwrap().unwrap()).unwrap();

        assert_eq!(first["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert!(first["id"].is_null());
        assert_eq!(second["id"], 2);
        assert_eq!(second["result"], json!({}));

        handle.await.unwrap().unwrap();
    }
}
