//! Tool handler registry
//!
//! Central registry for all tool handlers with automatic routing based on
//! tool names. Required fields are validated against the tool definitions
//! before any handler runs, so a malformed request can never reach the
//! executor.

use crate::api::{ToolHandler, ToolHandlerContext};
use crate::tool_definitions::{self, PUBLIC_TOOLS};
use chisel_foundation::{ChiselError, ChiselResult, ToolCall};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry for tool handlers providing automatic routing
pub struct ToolRegistry {
    /// Map from tool name to handler
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a tool handler with its type name for diagnostics
    ///
    /// All tools returned by `handler.tool_names()` are registered. A
    /// duplicate registration replaces the previous handler and logs a
    /// warning.
    pub fn register_with_name(&mut self, handler: Arc<dyn ToolHandler>, handler_name: &str) {
        for tool_name in handler.tool_names() {
            debug!(
                tool_name = %tool_name,
                handler_name = %handler_name,
                "Registering tool handler"
            );

            if self
                .handlers
                .insert(tool_name.to_string(), handler.clone())
                .is_some()
            {
                warn!(
                    tool_name = %tool_name,
                    "Tool handler replaced (duplicate registration)"
                );
            }
        }
    }

    /// Route a tool call to the appropriate handler
    ///
    /// Arguments are validated against the tool's requirements first;
    /// validation failures never invoke the handler.
    pub async fn handle_tool(
        &self,
        tool_call: ToolCall,
        context: &ToolHandlerContext,
    ) -> ChiselResult<Value> {
        let handler = self.handlers.get(&tool_call.name).ok_or_else(|| {
            ChiselError::invalid_request(format!(
                "Unknown tool: '{}'. Available tools: {}",
                tool_call.name,
                PUBLIC_TOOLS.join(", ")
            ))
        })?;

        validate_arguments(&tool_call)?;

        handler.handle_tool_call(context, &tool_call).await
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, tool_name: &str) -> bool {
        self.handlers.contains_key(tool_name)
    }

    /// Get all registered tool names, sorted
    pub fn list_tools(&self) -> Vec<String> {
        let mut tools: Vec<String> = self.handlers.keys().cloned().collect();
        tools.sort();
        tools
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a field's JSON type against the schema's declared type
fn type_matches(field: &str, value: &Value) -> bool {
    match tool_definitions::field_type(field) {
        "integer" => value.as_u64().is_some(),
        _ => value.is_string(),
    }
}

/// Validate required fields and one-of locator groups before dispatch
fn validate_arguments(tool_call: &ToolCall) -> ChiselResult<()> {
    let reqs = match tool_definitions::requirements(&tool_call.name) {
        Some(reqs) => reqs,
        // tools without requirements (none today) skip validation
        None => return Ok(()),
    };

    let empty = Value::Object(serde_json::Map::new());
    let args = tool_call.arguments.as_ref().unwrap_or(&empty);
    let args = args.as_object().ok_or_else(|| {
        ChiselError::invalid_request(format!(
            "Arguments for '{}' must be a JSON object",
            tool_call.name
        ))
    })?;

    let mut problems: Vec<String> = Vec::new();

    for field in reqs.required {
        match args.get(*field) {
            None => problems.push(format!("missing '{}'", field)),
            Some(value) if !type_matches(field, value) => problems.push(format!(
                "'{}' must be a {}",
                field,
                tool_definitions::field_type(field)
            )),
            Some(_) => {}
        }
    }

    for group in reqs.one_of {
        let satisfied = group
            .iter()
            .any(|field| matches!(args.get(*field), Some(v) if type_matches(field, v)));
        if !satisfied {
            problems.push(format!("one of [{}] is required", group.join(", ")));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ChiselError::invalid_request(format!(
            "Bad request for '{}': {}",
            tool_call.name,
            problems.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct TestHandler {
        tools: Vec<&'static str>,
    }

    #[async_trait]
    impl ToolHandler for TestHandler {
        fn tool_names(&self) -> &[&str] {
            &self.tools
        }

        async fn handle_tool_call(
            &self,
            _context: &ToolHandlerContext,
            tool_call: &ToolCall,
        ) -> ChiselResult<Value> {
            Ok(json!({
                "tool": tool_call.name,
                "handled": true
            }))
        }
    }

    #[test]
    fn registry_registration() {
        let mut registry = ToolRegistry::new();
        let handler = Arc::new(TestHandler {
            tools: vec!["tool1", "tool2"],
        });

        registry.register_with_name(handler, "TestHandler");

        assert!(registry.has_tool("tool1"));
        assert!(registry.has_tool("tool2"));
        assert!(!registry.has_tool("tool3"));
    }

    #[test]
    fn list_tools_is_sorted() {
        let mut registry = ToolRegistry::new();
        let handler1 = Arc::new(TestHandler {
            tools: vec!["b_tool", "a_tool"],
        });
        let handler2 = Arc::new(TestHandler {
            tools: vec!["c_tool"],
        });

        registry.register_with_name(handler1, "TestHandler1");
        registry.register_with_name(handler2, "TestHandler2");

        assert_eq!(registry.list_tools(), vec!["a_tool", "b_tool", "c_tool"]);
    }

    #[test]
    fn validation_reports_every_offending_field() {
        let call = ToolCall {
            name: "rename_element".to_string(),
            arguments: Some(json!({ "offset": "not-a-number" })),
        };
        let err = validate_arguments(&call).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing 'filePath'"));
        assert!(msg.contains("missing 'newName'"));
        assert!(msg.contains("one of [codeToSymbol, offset, symbolName]"));
    }

    #[test]
    fn validation_accepts_any_locator_variant() {
        for args in [
            json!({ "filePath": "/tmp/a.txt", "newName": "D", "codeToSymbol": "class " }),
            json!({ "filePath": "/tmp/a.txt", "newName": "D", "offset": 6 }),
            json!({ "filePath": "/tmp/a.txt", "newName": "D", "symbolName": "C" }),
        ] {
            let call = ToolCall {
                name: "rename_element".to_string(),
                arguments: Some(args),
            };
            assert!(validate_arguments(&call).is_ok());
        }
    }

    #[test]
    fn validation_rejects_mistyped_one_of_field() {
        let call = ToolCall {
            name: "find_usages".to_string(),
            arguments: Some(json!({ "filePath": "/tmp/a.txt", "codeToSymbol": 42 })),
        };
        assert!(validate_arguments(&call).is_err());
    }
}
