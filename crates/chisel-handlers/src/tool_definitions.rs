//! Tool definitions - single source of truth
//!
//! Canonical schemas and the public tool list. Tool discovery
//! (`tools/list`) and pre-dispatch argument validation both reference these
//! definitions.
//!
//! All path fields take absolute filesystem paths; the dispatcher does not
//! resolve relative paths. `codeToSymbol` is the literal source text from
//! file start up to (and not including) the target symbol; the locator's
//! offset is its character length.

use serde_json::{json, Value};

/// List of all public tool names
pub const PUBLIC_TOOLS: &[&str] = &[
    "rename_element",
    "move_element",
    "delete_element",
    "find_usages",
    "move_file",
    "rename_file",
    "delete_file",
];

/// Get all public tool definitions as JSON schemas
pub fn get_all_tool_definitions() -> Vec<Value> {
    vec![
        rename_element_schema(),
        move_element_schema(),
        delete_element_schema(),
        find_usages_schema(),
        move_file_schema(),
        rename_file_schema(),
        delete_file_schema(),
    ]
}

/// Field requirements for pre-dispatch validation
///
/// `required` fields must always be present; at least one field from each
/// `one_of` group must be present. Kept adjacent to the schemas so the two
/// never drift.
pub struct ToolRequirements {
    pub required: &'static [&'static str],
    pub one_of: &'static [&'static [&'static str]],
}

/// Requirements for a tool, or None if the tool is unknown
pub fn requirements(name: &str) -> Option<ToolRequirements> {
    match name {
        "rename_element" => Some(ToolRequirements {
            required: &["filePath", "newName"],
            one_of: &[&["codeToSymbol", "offset", "symbolName"]],
        }),
        "move_element" => Some(ToolRequirements {
            required: &["filePath", "targetDirectoryPath"],
            one_of: &[&["codeToSymbol", "offset"]],
        }),
        "delete_element" => Some(ToolRequirements {
            required: &["filePath"],
            one_of: &[&["codeToSymbol", "offset"]],
        }),
        "find_usages" => Some(ToolRequirements {
            required: &["filePath"],
            one_of: &[&["codeToSymbol", "symbolName"]],
        }),
        "move_file" => Some(ToolRequirements {
            required: &["targetFilePath", "destDirectoryPath"],
            one_of: &[],
        }),
        "rename_file" => Some(ToolRequirements {
            required: &["targetFilePath", "newName"],
            one_of: &[],
        }),
        "delete_file" => Some(ToolRequirements {
            required: &["targetFilePath"],
            one_of: &[],
        }),
        _ => None,
    }
}

/// Expected JSON type for a field, used by validation
pub fn field_type(field: &str) -> &'static str {
    match field {
        "offset" | "lineNumber" => "integer",
        _ => "string",
    }
}

fn locator_properties() -> Value {
    json!({
        "codeToSymbol": {
            "type": "string",
            "description": "Literal source text from file start up to (not including) the target symbol; the offset is its length"
        },
        "offset": {
            "type": "integer",
            "description": "Exact character offset of the target symbol"
        },
        "symbolName": {
            "type": "string",
            "description": "Identifier of the target declaration"
        },
        "lineNumber": {
            "type": "integer",
            "description": "Approximate 1-based declaration line, used to disambiguate same-named symbols"
        }
    })
}

fn merge(base: Value, extra: Value) -> Value {
    let mut merged = base;
    if let (Some(obj), Some(add)) = (merged.as_object_mut(), extra.as_object()) {
        for (k, v) in add {
            obj.insert(k.clone(), v.clone());
        }
    }
    merged
}

/// Schema for `rename_element`
pub fn rename_element_schema() -> Value {
    json!({
        "name": "rename_element",
        "description": "Rename the resolved element; the backend updates all references project-wide.",
        "inputSchema": {
            "type": "object",
            "properties": merge(locator_properties(), json!({
                "filePath": { "type": "string", "description": "Absolute path to the file containing the symbol" },
                "newName": { "type": "string", "description": "New identifier for the element" }
            })),
            "required": ["filePath", "newName"],
            "anyOf": [
                { "required": ["codeToSymbol"] },
                { "required": ["offset"] },
                { "required": ["symbolName"] }
            ]
        }
    })
}

/// Schema for `move_element`
pub fn move_element_schema() -> Value {
    json!({
        "name": "move_element",
        "description": "Move the resolved element. Element moves are file-granular: the element's containing file is moved into the target directory.",
        "inputSchema": {
            "type": "object",
            "properties": merge(locator_properties(), json!({
                "filePath": { "type": "string", "description": "Absolute path to the file containing the symbol" },
                "targetDirectoryPath": { "type": "string", "description": "Absolute path of an existing destination directory" }
            })),
            "required": ["filePath", "targetDirectoryPath"],
            "anyOf": [
                { "required": ["codeToSymbol"] },
                { "required": ["offset"] }
            ]
        }
    })
}

/// Schema for `delete_element`
pub fn delete_element_schema() -> Value {
    json!({
        "name": "delete_element",
        "description": "Safe-delete the resolved element: deletion is refused while references to it remain.",
        "inputSchema": {
            "type": "object",
            "properties": merge(locator_properties(), json!({
                "filePath": { "type": "string", "description": "Absolute path to the file containing the symbol" }
            })),
            "required": ["filePath"],
            "anyOf": [
                { "required": ["codeToSymbol"] },
                { "required": ["offset"] }
            ]
        }
    })
}

/// Schema for `find_usages`
pub fn find_usages_schema() -> Value {
    json!({
        "name": "find_usages",
        "description": "List references to the resolved element. Returns {usages: []} when nothing references it. Record order is not guaranteed across runs.",
        "inputSchema": {
            "type": "object",
            "properties": merge(locator_properties(), json!({
                "filePath": { "type": "string", "description": "Absolute path to the file containing the symbol" }
            })),
            "required": ["filePath"],
            "anyOf": [
                { "required": ["codeToSymbol"] },
                { "required": ["symbolName"] }
            ]
        }
    })
}

/// Schema for `move_file`
pub fn move_file_schema() -> Value {
    json!({
        "name": "move_file",
        "description": "Move a whole file into an existing directory.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "targetFilePath": { "type": "string", "description": "Absolute path of the file to move" },
                "destDirectoryPath": { "type": "string", "description": "Absolute path of an existing destination directory" }
            },
            "required": ["targetFilePath", "destDirectoryPath"]
        }
    })
}

/// Schema for `rename_file`
pub fn rename_file_schema() -> Value {
    json!({
        "name": "rename_file",
        "description": "Rename a whole file in place.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "targetFilePath": { "type": "string", "description": "Absolute path of the file to rename" },
                "newName": { "type": "string", "description": "New file name (not a path)" }
            },
            "required": ["targetFilePath", "newName"]
        }
    })
}

/// Schema for `delete_file`
pub fn delete_file_schema() -> Value {
    json!({
        "name": "delete_file",
        "description": "Delete a whole file. File deletion is unconditional; it is not gated on a reference check.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "targetFilePath": { "type": "string", "description": "Absolute path of the file to delete" }
            },
            "required": ["targetFilePath"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_public_tool_has_a_schema_and_requirements() {
        let definitions = get_all_tool_definitions();
        assert_eq!(definitions.len(), PUBLIC_TOOLS.len());
        for tool in PUBLIC_TOOLS {
            assert!(
                definitions.iter().any(|d| d["name"] == *tool),
                "missing schema for {}",
                tool
            );
            assert!(requirements(tool).is_some(), "missing requirements for {}", tool);
        }
        assert!(requirements("made_up_tool").is_none());
    }

    #[test]
    fn numeric_fields_are_integers() {
        assert_eq!(field_type("offset"), "integer");
        assert_eq!(field_type("lineNumber"), "integer");
        assert_eq!(field_type("filePath"), "string");
    }
}
