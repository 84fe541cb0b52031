//! Wire protocol message types and result envelopes
//!
//! The wire protocol is JSON-RPC shaped: clients send `RpcRequest` lines and
//! receive `RpcResponse` lines. Tool invocations travel as `tools/call`
//! requests with a `ToolCall` payload.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Protocol version reported during `initialize`
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Message envelope - a request, a response, or a notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum RpcMessage {
    Request(RpcRequest),
    Response(RpcResponse),
}

/// Request message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn default_jsonrpc_version() -> String {
    "2.0".to_string()
}

/// Response message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponse {
    #[serde(default = "default_jsonrpc_version")]
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Build a success response carrying `result`
    pub fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response
    pub fn err(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_jsonrpc_version(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// Error object carried in a response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool call parameters for `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// A single reference hit produced by `find_usages`
///
/// Line and column are 1-based. When the hit's document could not be loaded
/// they are set to -1 and the snippet carries the raw hit text; the hit is
/// never dropped silently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub file_path: String,
    pub line_number: i64,
    pub column_number: i64,
    pub line_snippet: String,
}

/// Result envelope for successful mutating operations
pub fn success_envelope() -> Value {
    json!({ "status": "success" })
}

/// Result envelope for failed operations
pub fn error_envelope(message: impl Into<String>) -> Value {
    json!({ "status": "error", "message": message.into() })
}

/// Result envelope for `find_usages`
pub fn usages_envelope(usages: &[UsageRecord]) -> Value {
    json!({ "usages": usages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_roundtrip() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"find_usages","arguments":{"filePath":"/tmp/a.txt"}}}"#;
        let msg: RpcMessage = serde_json::from_str(raw).unwrap();
        match msg {
            RpcMessage::Request(req) => {
                assert_eq!(req.method, "tools/call");
                let call: ToolCall = serde_json::from_value(req.params.unwrap()).unwrap();
                assert_eq!(call.name, "find_usages");
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn usage_record_wire_names_are_camel_case() {
        let record = UsageRecord {
            file_path: "/tmp/a.txt".into(),
            line_number: 3,
            column_number: 7,
            line_snippet: "class C {}".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["filePath"], "/tmp/a.txt");
        assert_eq!(value["lineNumber"], 3);
        assert_eq!(value["columnNumber"], 7);
        assert_eq!(value["lineSnippet"], "class C {}");
    }

    #[test]
    fn envelopes() {
        assert_eq!(success_envelope()["status"], "success");
        let err = error_envelope("no such file");
        assert_eq!(err["status"], "error");
        assert_eq!(err["message"], "no such file");
        assert!(usages_envelope(&[])["usages"].as_array().unwrap().is_empty());
    }
}
