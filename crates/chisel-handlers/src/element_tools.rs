//! Handlers for element-level refactoring tools
//!
//! Handles: rename_element, move_element, delete_element, find_usages.
//! Each call loads the document, resolves the locator fresh, and applies the
//! operation through the executor; the resolved element never outlives the
//! request.

use crate::api::{ToolHandler, ToolHandlerContext};
use async_trait::async_trait;
use chisel_engine::{Operation, OperationOutcome};
use chisel_foundation::{
    success_envelope, usages_envelope, ChiselError, ChiselResult, ToolCall,
};
use chisel_model::{resolve, Locator};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handler for element-level operations
pub struct ElementToolsHandler;

impl ElementToolsHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ElementToolsHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementParams {
    file_path: String,
    #[serde(default)]
    code_to_symbol: Option<String>,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    symbol_name: Option<String>,
    #[serde(default)]
    line_number: Option<u32>,
    #[serde(default)]
    new_name: Option<String>,
    #[serde(default)]
    target_directory_path: Option<String>,
}

impl ElementParams {
    /// Build the locator, preferring the least ambiguous strategy:
    /// codeToSymbol (exact prefix), then offset, then symbolName.
    fn locator(&self) -> ChiselResult<Locator> {
        if let Some(prefix) = &self.code_to_symbol {
            return Ok(Locator::ByPrefixLength {
                prefix_text: prefix.clone(),
            });
        }
        if let Some(offset) = self.offset {
            return Ok(Locator::ByOffset { offset });
        }
        if let Some(name) = &self.symbol_name {
            return Ok(Locator::ByNameAndLine {
                name: name.clone(),
                approximate_line: self.line_number,
            });
        }
        Err(ChiselError::invalid_request(
            "one of codeToSymbol, offset, or symbolName is required",
        ))
    }

    fn absolute_path(&self) -> ChiselResult<&Path> {
        let path = Path::new(&self.file_path);
        if !path.is_absolute() {
            return Err(ChiselError::invalid_request(format!(
                "filePath must be absolute, got '{}'",
                self.file_path
            )));
        }
        Ok(path)
    }
}

fn parse_params(tool_call: &ToolCall) -> ChiselResult<ElementParams> {
    let args = tool_call.arguments.clone().ok_or_else(|| {
        ChiselError::invalid_request(format!("Missing arguments for {}", tool_call.name))
    })?;
    serde_json::from_value(args).map_err(|e| {
        ChiselError::invalid_request(format!("Invalid {} parameters: {}", tool_call.name, e))
    })
}

fn operation_for(tool_name: &str, params: &ElementParams) -> ChiselResult<Operation> {
    match tool_name {
        "rename_element" => {
            let new_name = params.new_name.clone().ok_or_else(|| {
                ChiselError::invalid_request("rename_element requires newName")
            })?;
            Ok(Operation::Rename { new_name })
        }
        "move_element" => {
            let dir = params.target_directory_path.clone().ok_or_else(|| {
                ChiselError::invalid_request("move_element requires targetDirectoryPath")
            })?;
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ChiselError::invalid_request(format!(
                    "targetDirectoryPath must be absolute, got '{}'",
                    dir.display()
                )));
            }
            Ok(Operation::Move {
                target_directory: dir,
            })
        }
        "delete_element" => Ok(Operation::Delete),
        "find_usages" => Ok(Operation::FindUsages),
        other => Err(ChiselError::internal(format!(
            "ElementToolsHandler routed unexpected tool '{}'",
            other
        ))),
    }
}

#[async_trait]
impl ToolHandler for ElementToolsHandler {
    fn tool_names(&self) -> &[&str] {
        &[
            "rename_element",
            "move_element",
            "delete_element",
            "find_usages",
        ]
    }

    async fn handle_tool_call(
        &self,
        context: &ToolHandlerContext,
        tool_call: &ToolCall,
    ) -> ChiselResult<Value> {
        let params = parse_params(tool_call)?;
        let path = params.absolute_path()?;
        let locator = params.locator()?;
        let op = operation_for(&tool_call.name, &params)?;

        debug!(
            tool = %tool_call.name,
            path = %path.display(),
            locator = ?locator,
            "Resolving element"
        );

        let document = context.app_state.model.load(path).await?;
        let element = resolve(&document, &locator)?;

        info!(
            tool = %tool_call.name,
            path = %path.display(),
            element = %element.text,
            line = element.line,
            "Element resolved"
        );

        match context.app_state.executor.apply(&element, &op).await? {
            OperationOutcome::Applied => Ok(success_envelope()),
            OperationOutcome::Usages(records) => Ok(usages_envelope(&records)),
        }
    }
}
