//! Completion notifications
//!
//! After a mutation commits, the dispatcher emits a best-effort notification
//! so interested observers (editors, test harnesses) can refresh. Delivery
//! failures are logged and never affect the response already produced.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// Observer notified after a tool call completes
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Called once per completed tool call with the tool name and the result
    /// envelope. Implementations must not fail the request; errors are
    /// swallowed by the dispatcher.
    async fn tool_completed(&self, tool_name: &str, result: &Value);
}

/// Notifier that records completions in the structured log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn tool_completed(&self, tool_name: &str, result: &Value) {
        // closures, not `Value::as_str`: inside the tracing macros the
        // `Value` path resolves to the tracing::Value trait
        let status = result.get("status").and_then(|v| v.as_str());
        match status {
            Some("error") => {
                let message = result
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                warn!(
                    tool = tool_name,
                    message, "Tool completed with error envelope"
                );
            }
            _ => debug!(tool = tool_name, "Tool completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn log_notifier_handles_both_envelope_shapes() {
        let notifier = LogNotifier;
        notifier
            .tool_completed("rename_element", &json!({ "status": "success" }))
            .await;
        notifier
            .tool_completed(
                "delete_file",
                &json!({ "status": "error", "message": "no such file" }),
            )
            .await;
        notifier
            .tool_completed("find_usages", &json!({ "usages": [] }))
            .await;
    }
}
