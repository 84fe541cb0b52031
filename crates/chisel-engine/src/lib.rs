//! chisel-engine: the refactoring executor
//!
//! Applies a resolved element and an operation kind against the code-model
//! backend, inside a mutation-safe scope: the document write lock is held
//! from mutation entry to commit or failure, every backend call runs under a
//! bounded timeout, and backend error text is propagated verbatim.

mod executor;

pub use executor::{Executor, OperationOutcome};

use std::path::PathBuf;

/// A refactoring intent, carrying exactly the inputs it needs
///
/// Operations never carry a resolved element; they are applied to a locator
/// result produced fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Rename the resolved element project-wide
    Rename { new_name: String },
    /// Move the resolved element's file into `target_directory`.
    ///
    /// Element-level move is intentionally narrowed to whole-file
    /// granularity: the element is resolved to confirm the target exists,
    /// then its containing file moves.
    Move { target_directory: PathBuf },
    /// Safe-delete the resolved element (gated on a reference check)
    Delete,
    /// List references to the resolved element
    FindUsages,
    /// Move a whole file into `dest`
    MoveFile { dest: PathBuf },
    /// Rename a whole file in place
    RenameFile { new_name: String },
    /// Delete a whole file unconditionally
    DeleteFile,
}

impl Operation {
    /// Short name used in timeout and log messages
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Rename { .. } => "rename",
            Operation::Move { .. } => "move",
            Operation::Delete => "delete",
            Operation::FindUsages => "find_usages",
            Operation::MoveFile { .. } => "move_file",
            Operation::RenameFile { .. } => "rename_file",
            Operation::DeleteFile => "delete_file",
        }
    }
}
