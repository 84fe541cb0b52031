//! Handler API: the core trait and context for tool handlers

use async_trait::async_trait;
use chisel_engine::Executor;
use chisel_foundation::{ChiselResult, ToolCall};
use chisel_model::CodeModel;
use serde_json::Value;
use std::sync::Arc;

/// Application state containing all services
pub struct AppState {
    /// Refactoring executor
    pub executor: Arc<Executor>,
    /// Code model backend, for document loading and resolution
    pub model: Arc<dyn CodeModel>,
}

/// Context provided to tool handlers
pub struct ToolHandlerContext {
    pub app_state: Arc<AppState>,
}

/// Unified trait for all tool handlers
///
/// Handlers receive a validated tool call and the shared context, and return
/// the tool's result envelope as JSON.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool names this handler is responsible for
    fn tool_names(&self) -> &[&str];

    /// Handle an incoming tool call
    async fn handle_tool_call(
        &self,
        context: &ToolHandlerContext,
        tool_call: &ToolCall,
    ) -> ChiselResult<Value>;
}
