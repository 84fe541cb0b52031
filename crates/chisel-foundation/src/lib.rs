//! chisel-foundation: core types shared by every chisel crate
//!
//! This crate provides the foundational building blocks for the chisel
//! refactoring server:
//! - The error taxonomy used across all layers
//! - Wire protocol message types and result envelopes
//! - Configuration loading and logging initialization

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;

pub use config::AppConfig;
pub use error::{ChiselError, ChiselResult};
pub use protocol::{
    error_envelope, success_envelope, usages_envelope, RpcError, RpcMessage, RpcRequest,
    RpcResponse, ToolCall, UsageRecord,
};
