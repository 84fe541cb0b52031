//! Operation execution against the code-model backend

use crate::Operation;
use chisel_foundation::{ChiselError, ChiselResult, UsageRecord};
use chisel_model::{CodeModel, DocumentLocks, ReferenceHit, ResolvedElement};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedRwLockWriteGuard;
use tracing::{debug, info, warn};

/// Result of a successfully executed operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// The mutation fully committed
    Applied,
    /// Usage list from `find_usages`; empty means zero references
    Usages(Vec<UsageRecord>),
}

/// Executes operations against the backend inside mutation-safe scopes
pub struct Executor {
    model: Arc<dyn CodeModel>,
    locks: Arc<DocumentLocks>,
    timeout: Duration,
}

impl Executor {
    pub fn new(model: Arc<dyn CodeModel>, locks: Arc<DocumentLocks>, timeout: Duration) -> Self {
        Self {
            model,
            locks,
            timeout,
        }
    }

    pub fn model(&self) -> Arc<dyn CodeModel> {
        self.model.clone()
    }

    /// Apply an element-level operation to a freshly resolved element
    pub async fn apply(
        &self,
        element: &ResolvedElement,
        op: &Operation,
    ) -> ChiselResult<OperationOutcome> {
        debug!(
            operation = op.name(),
            path = %element.path.display(),
            line = element.line,
            element = %element.text,
            "Executing operation"
        );

        let outcome = match op {
            Operation::Rename { new_name } => {
                // rename edits every document carrying the name, so the
                // whole edit plan is write-locked before the first write
                let _guards = self.write_locks_for_rename(element).await?;
                self.bounded(op.name(), self.model.rename(element, new_name))
                    .await?;
                OperationOutcome::Applied
            }
            Operation::Move { target_directory } => {
                // Element move is file-granular: the element was resolved to
                // confirm it exists, its file is what moves
                let lock = self.locks.lock_for(&element.path);
                let _write = lock.write().await;
                self.bounded(
                    op.name(),
                    self.model.move_file(&element.path, target_directory),
                )
                .await?;
                OperationOutcome::Applied
            }
            Operation::Delete => {
                let lock = self.locks.lock_for(&element.path);
                let _write = lock.write().await;
                self.bounded(op.name(), self.model.safe_delete(element))
                    .await?;
                OperationOutcome::Applied
            }
            Operation::FindUsages => {
                let lock = self.locks.lock_for(&element.path);
                let _read = lock.read().await;
                let records = self
                    .bounded(op.name(), async {
                        let hits = self.model.find_references(element).await?;
                        Ok(self.collect_usages(hits).await)
                    })
                    .await?;
                OperationOutcome::Usages(records)
            }
            other => {
                return Err(ChiselError::invalid_request(format!(
                    "{} is a file-level operation, not an element operation",
                    other.name()
                )));
            }
        };

        info!(
            operation = op.name(),
            path = %element.path.display(),
            "Operation committed"
        );
        Ok(outcome)
    }

    /// Apply a file-level operation
    pub async fn apply_to_file(&self, path: &Path, op: &Operation) -> ChiselResult<OperationOutcome> {
        debug!(operation = op.name(), path = %path.display(), "Executing file operation");

        let lock = self.locks.lock_for(path);
        let _write = lock.write().await;
        match op {
            Operation::MoveFile { dest } => {
                self.bounded(op.name(), self.model.move_file(path, dest))
                    .await?;
            }
            Operation::RenameFile { new_name } => {
                self.bounded(op.name(), self.model.rename_file(path, new_name))
                    .await?;
            }
            Operation::DeleteFile => {
                self.bounded(op.name(), self.model.delete_file(path)).await?;
            }
            other => {
                return Err(ChiselError::invalid_request(format!(
                    "{} is an element operation, not a file operation",
                    other.name()
                )));
            }
        }

        info!(operation = op.name(), path = %path.display(), "Operation committed");
        Ok(OperationOutcome::Applied)
    }

    /// Write locks for every document a rename will edit
    ///
    /// Paths are sorted and deduplicated so two concurrent renames always
    /// acquire in the same order and cannot deadlock.
    async fn write_locks_for_rename(
        &self,
        element: &ResolvedElement,
    ) -> ChiselResult<Vec<OwnedRwLockWriteGuard<()>>> {
        let mut paths = self
            .bounded("rename", self.model.affected_by_rename(element))
            .await?;
        paths.push(element.path.clone());
        paths.sort();
        paths.dedup();

        let mut guards = Vec::with_capacity(paths.len());
        for path in &paths {
            guards.push(self.locks.lock_for(path).write_owned().await);
        }
        Ok(guards)
    }

    /// Bound a backend call so an unresponsive backend fails instead of
    /// hanging the request
    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = ChiselResult<T>>,
    ) -> ChiselResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_secs = self.timeout.as_secs(),
                    "Backend call timed out"
                );
                Err(ChiselError::timeout(operation.to_string()))
            }
        }
    }

    /// Convert raw reference hits into 1-based usage records
    ///
    /// A hit whose document cannot be loaded still produces a record with
    /// the (-1, -1) sentinel and the raw hit text; completeness of the list
    /// outranks uniform formatting.
    async fn collect_usages(&self, hits: Vec<ReferenceHit>) -> Vec<UsageRecord> {
        let mut records = Vec::with_capacity(hits.len());
        for hit in hits {
            let record = match self.model.load(&hit.path).await {
                Ok(doc) => {
                    let (line, column) = doc.position_of(hit.offset);
                    let snippet = doc
                        .line_snippet(line)
                        .unwrap_or_else(|| hit.text.clone());
                    UsageRecord {
                        file_path: hit.path.display().to_string(),
                        line_number: line as i64,
                        column_number: column as i64,
                        line_snippet: snippet,
                    }
                }
                Err(e) => {
                    warn!(
                        path = %hit.path.display(),
                        error = %e,
                        "Usage hit document could not be loaded; emitting sentinel record"
                    );
                    UsageRecord {
                        file_path: hit.path.display().to_string(),
                        line_number: -1,
                        column_number: -1,
                        line_snippet: hit.text,
                    }
                }
            };
            records.push(record);
        }
        records
    }
}
