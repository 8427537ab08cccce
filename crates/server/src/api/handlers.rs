use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tariffscope_mcp::protocol::{JsonRpcError, JsonRpcResponse, ListToolsResult};

/// List tool schemas without going through JSON-RPC
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResult> {
    Json(ListToolsResult {
        tools: state.registry().list_schemas(),
    })
}

/// JSON-RPC over HTTP: one message per POST
///
/// The body is taken raw so malformed JSON (or non-UTF-8 bytes) gets a
/// JSON-RPC parse error rather than an HTTP rejection.
pub async fn mcp_message(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let reply = match std::str::from_utf8(&body) {
        Ok(text) => state.mcp.handle_message(text).await,
        Err(_) => Some(JsonRpcResponse::error(
            serde_json::Value::Null,
            JsonRpcError::parse_error(),
        )),
    };

    match reply {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
