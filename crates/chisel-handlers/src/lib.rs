//! chisel-handlers: tool registry and request dispatch
//!
//! Maps named refactoring tools to input schemas and handlers, validates
//! decoded requests before any handler runs, and routes tool calls to the
//! executor. The dispatcher never lets a handler fault escape to the
//! transport: every failure becomes a structured error envelope.

pub mod api;
pub mod dispatcher;
pub mod element_tools;
pub mod file_tools;
pub mod notify;
pub mod tool_definitions;
pub mod tool_registry;

pub use api::{AppState, ToolHandler, ToolHandlerContext};
pub use dispatcher::Dispatcher;
pub use element_tools::ElementToolsHandler;
pub use file_tools::FileToolsHandler;
pub use notify::{LogNotifier, Notifier};
pub use tool_registry::ToolRegistry;
