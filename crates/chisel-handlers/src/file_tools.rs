//! Handlers for whole-file tools
//!
//! Handles: move_file, rename_file, delete_file. File operations do not go
//! through element resolution; they validate the target path and hand off to
//! the executor directly.

use crate::api::{ToolHandler, ToolHandlerContext};
use async_trait::async_trait;
use chisel_engine::{Operation, OperationOutcome};
use chisel_foundation::{success_envelope, ChiselError, ChiselResult, ToolCall};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Handler for file-level operations
pub struct FileToolsHandler;

impl FileToolsHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileToolsHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileParams {
    target_file_path: String,
    #[serde(default)]
    dest_directory_path: Option<String>,
    #[serde(default)]
    new_name: Option<String>,
}

impl FileParams {
    fn target(&self) -> ChiselResult<&Path> {
        absolute(&self.target_file_path, "targetFilePath")
    }
}

fn absolute<'a>(raw: &'a str, field: &str) -> ChiselResult<&'a Path> {
    let path = Path::new(raw);
    if !path.is_absolute() {
        return Err(ChiselError::invalid_request(format!(
            "{} must be absolute, got '{}'",
            field, raw
        )));
    }
    Ok(path)
}

fn operation_for(tool_name: &str, params: &FileParams) -> ChiselResult<Operation> {
    match tool_name {
        "move_file" => {
            let dest = params.dest_directory_path.as_deref().ok_or_else(|| {
                ChiselError::invalid_request("move_file requires destDirectoryPath")
            })?;
            let dest = absolute(dest, "destDirectoryPath")?;
            Ok(Operation::MoveFile {
                dest: dest.to_path_buf(),
            })
        }
        "rename_file" => {
            let new_name = params
                .new_name
                .clone()
                .ok_or_else(|| ChiselError::invalid_request("rename_file requires newName"))?;
            // a new name containing separators would silently become a move
            if new_name.contains(std::path::MAIN_SEPARATOR) || new_name.contains('/') {
                return Err(ChiselError::invalid_request(format!(
                    "newName must be a bare file name, got '{}'",
                    new_name
                )));
            }
            Ok(Operation::RenameFile { new_name })
        }
        "delete_file" => Ok(Operation::DeleteFile),
        other => Err(ChiselError::internal(format!(
            "FileToolsHandler routed unexpected tool '{}'",
            other
        ))),
    }
}

#[async_trait]
impl ToolHandler for FileToolsHandler {
    fn tool_names(&self) -> &[&str] {
        &["move_file", "rename_file", "delete_file"]
    }

    async fn handle_tool_call(
        &self,
        context: &ToolHandlerContext,
        tool_call: &ToolCall,
    ) -> ChiselResult<Value> {
        let args = tool_call.arguments.clone().ok_or_else(|| {
            ChiselError::invalid_request(format!("Missing arguments for {}", tool_call.name))
        })?;
        let params: FileParams = serde_json::from_value(args).map_err(|e| {
            ChiselError::invalid_request(format!("Invalid {} parameters: {}", tool_call.name, e))
        })?;

        let target = params.target()?;
        let op = operation_for(&tool_call.name, &params)?;

        debug!(
            tool = %tool_call.name,
            path = %target.display(),
            "Executing file operation"
        );

        match context.app_state.executor.apply_to_file(target, &op).await? {
            OperationOutcome::Applied => Ok(success_envelope()),
            OperationOutcome::Usages(_) => Err(ChiselError::internal(
                "file operation produced a usages outcome",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn params(args: Value) -> FileParams {
        serde_json::from_value(args).unwrap()
    }

    #[test]
    fn move_file_requires_absolute_destination() {
        let p = params(json!({
            "targetFilePath": "/tmp/a.txt",
            "destDirectoryPath": "sub"
        }));
        assert!(operation_for("move_file", &p).is_err());

        let p = params(json!({
            "targetFilePath": "/tmp/a.txt",
            "destDirectoryPath": "/tmp/sub"
        }));
        assert_eq!(
            operation_for("move_file", &p).unwrap(),
            Operation::MoveFile {
                dest: PathBuf::from("/tmp/sub")
            }
        );
    }

    #[test]
    fn rename_file_rejects_path_separators_in_name() {
        let p = params(json!({
            "targetFilePath": "/tmp/a.txt",
            "newName": "sub/b.txt"
        }));
        assert!(matches!(
            operation_for("rename_file", &p).unwrap_err(),
            ChiselError::InvalidRequest { .. }
        ));
    }

    #[test]
    fn relative_target_is_rejected() {
        let p = params(json!({ "targetFilePath": "a.txt" }));
        assert!(p.target().is_err());
    }
}
