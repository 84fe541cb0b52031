//! Request dispatch
//!
//! Routes decoded requests by method. `tools/call` failures are converted to
//! error envelopes carried in the response `result`; only protocol-level
//! faults (unknown method, malformed params) become RPC errors. A fault in a
//! handler never escapes to the transport.

use crate::api::{AppState, ToolHandlerContext};
use crate::element_tools::ElementToolsHandler;
use crate::file_tools::FileToolsHandler;
use crate::notify::{LogNotifier, Notifier};
use crate::tool_definitions;
use crate::tool_registry::ToolRegistry;
use chisel_foundation::protocol::PROTOCOL_VERSION;
use chisel_foundation::{error_envelope, RpcRequest, RpcResponse, ToolCall};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// Dispatches requests to the tool registry
pub struct Dispatcher {
    registry: ToolRegistry,
    context: ToolHandlerContext,
    notifier: Arc<dyn Notifier>,
}

impl Dispatcher {
    /// Build a dispatcher with the standard handler set registered
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self::with_notifier(app_state, Arc::new(LogNotifier))
    }

    pub fn with_notifier(app_state: Arc<AppState>, notifier: Arc<dyn Notifier>) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register_with_name(Arc::new(ElementToolsHandler::new()), "ElementToolsHandler");
        registry.register_with_name(Arc::new(FileToolsHandler::new()), "FileToolsHandler");

        debug!(
            tools = ?registry.list_tools(),
            "Dispatcher ready"
        );

        Self {
            registry,
            context: ToolHandlerContext { app_state },
            notifier,
        }
    }

    /// Handle one decoded request and produce its response
    pub async fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let started = Instant::now();
        let method = request.method.clone();
        let id = request.id.clone();

        let response = match method.as_str() {
            "initialize" => RpcResponse::ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                    "capabilities": { "tools": {} }
                }),
            ),
            "tools/list" => RpcResponse::ok(
                id,
                json!({ "tools": tool_definitions::get_all_tool_definitions() }),
            ),
            "tools/call" => self.dispatch_tool_call(id, request.params).await,
            other => RpcResponse::err(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: '{}'", other),
            ),
        };

        info!(
            method = %method,
            duration_ms = started.elapsed().as_millis() as u64,
            ok = response.error.is_none(),
            "Request dispatched"
        );
        response
    }

    async fn dispatch_tool_call(
        &self,
        id: Option<serde_json::Value>,
        params: Option<serde_json::Value>,
    ) -> RpcResponse {
        let params = match params {
            Some(params) => params,
            None => {
                return RpcResponse::err(id, INVALID_PARAMS, "tools/call requires params");
            }
        };
        let tool_call: ToolCall = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return RpcResponse::err(
                    id,
                    INVALID_PARAMS,
                    format!("Malformed tools/call params: {}", e),
                );
            }
        };

        let tool_name = tool_call.name.clone();
        let result = match self.registry.handle_tool(tool_call, &self.context).await {
            Ok(result) => result,
            Err(e) => {
                error!(tool = %tool_name, error = %e, "Tool call failed");
                error_envelope(e.to_string())
            }
        };

        self.notifier.tool_completed(&tool_name, &result).await;
        RpcResponse::ok(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chisel_engine::Executor;
    use chisel_model::{DocumentLocks, TextCodeModel};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn dispatcher() -> Dispatcher {
        let model = Arc::new(TextCodeModel::new());
        let locks = Arc::new(DocumentLocks::new());
        let executor = Arc::new(Executor::new(model.clone(), locks, Duration::from_secs(5)));
        Dispatcher::new(Arc::new(AppState { executor, model }))
    }

    fn request(method: &str, params: Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn initialize_reports_protocol_version() {
        let response = dispatcher()
            .dispatch(request("initialize", json!({})))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["serverInfo"]["name"].is_string());
    }

    #[tokio::test]
    async fn tools_list_exposes_the_full_catalogue() {
        let response = dispatcher().dispatch(request("tools/list", json!({}))).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, tool_definitions::PUBLIC_TOOLS.len());
    }

    #[tokio::test]
    async fn unknown_method_is_an_rpc_error() {
        let response = dispatcher().dispatch(request("tools/purge", json!({}))).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_an_error_envelope() {
        let response = dispatcher()
            .dispatch(request(
                "tools/call",
                json!({ "name": "explode", "arguments": {} }),
            ))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["status"], "error");
        assert!(result["message"]
            .as_str()
            .unwrap()
            .contains("Unknown tool: 'explode'"));
    }

    #[tokio::test]
    async fn handler_failure_becomes_an_error_envelope() {
        // valid arguments, but the file does not exist
        let response = dispatcher()
            .dispatch(request(
                "tools/call",
                json!({
                    "name": "find_usages",
                    "arguments": {
                        "filePath": "/nonexistent/widget.src",
                        "symbolName": "Widget"
                    }
                }),
            ))
            .await;
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["status"], "error");
    }

    #[tokio::test]
    async fn find_usages_on_unreferenced_declaration_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("c.src");
        std::fs::write(&file, "class C {}").unwrap();

        let response = dispatcher()
            .dispatch(request(
                "tools/call",
                json!({
                    "name": "find_usages",
                    "arguments": {
                        "filePath": file.to_str().unwrap(),
                        "codeToSymbol": "class "
                    }
                }),
            ))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result, json!({ "usages": [] }));
    }

    #[tokio::test]
    async fn rename_element_rewrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("c.src");
        std::fs::write(&file, "class C {}").unwrap();

        let response = dispatcher()
            .dispatch(request(
                "tools/call",
                json!({
                    "name": "rename_element",
                    "arguments": {
                        "filePath": file.to_str().unwrap(),
                        "codeToSymbol": "class ",
                        "newName": "D"
                    }
                }),
            ))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["status"], "success");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "class D {}");
    }
}
