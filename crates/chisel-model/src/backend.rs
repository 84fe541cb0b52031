//! The pluggable code-model backend
//!
//! [`CodeModel`] is the seam between this core and the semantic engine that
//! owns real source understanding. Every method returns a synchronous
//! `Result`; backends built on completion callbacks must convert them behind
//! this trait, so a move or rename can never end in an ambiguous
//! "callback never fired" state.
//!
//! [`TextCodeModel`] is the bundled backend: a text-level model over the real
//! filesystem. Its reference search and rename cover the documents it has
//! indexed (everything passed through [`CodeModel::load`]).

use crate::document::Document;
use crate::locator::ResolvedElement;
use async_trait::async_trait;
use chisel_foundation::{ChiselError, ChiselResult};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .unwrap_or_else(|e| panic!("invalid identifier pattern: {}", e))
});

/// A raw reference hit from the backend's search
#[derive(Debug, Clone)]
pub struct ReferenceHit {
    pub path: PathBuf,
    /// Byte offset of the hit within its document
    pub offset: usize,
    /// The matched text itself
    pub text: String,
}

/// Backend contract for loading documents and applying refactorings
#[async_trait]
pub trait CodeModel: Send + Sync {
    /// Resolve a file path to a loaded document; may (re)index the file
    async fn load(&self, path: &Path) -> ChiselResult<Document>;

    /// Documents a rename of the element would edit
    ///
    /// The executor write-locks every returned path before calling
    /// [`CodeModel::rename`], so readers never observe a half-renamed set.
    /// The element's own document is always locked and may be omitted.
    async fn affected_by_rename(
        &self,
        _element: &ResolvedElement,
    ) -> ChiselResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    /// Rename the element project-wide, updating all references
    async fn rename(&self, element: &ResolvedElement, new_name: &str) -> ChiselResult<()>;

    /// Delete the element, gated on a reference check: deletion is refused
    /// while usages outside the declaration itself remain
    async fn safe_delete(&self, element: &ResolvedElement) -> ChiselResult<()>;

    /// Search for references to the element across indexed documents
    async fn find_references(&self, element: &ResolvedElement) -> ChiselResult<Vec<ReferenceHit>>;

    /// Move a file into an existing directory, returning the new path
    async fn move_file(&self, source: &Path, dest_dir: &Path) -> ChiselResult<PathBuf>;

    /// Rename a file in place, returning the new path
    async fn rename_file(&self, source: &Path, new_name: &str) -> ChiselResult<PathBuf>;

    /// Delete a file unconditionally
    async fn delete_file(&self, path: &Path) -> ChiselResult<()>;
}

/// Text-level code model over the real filesystem
///
/// Documents are indexed on load; rename and reference search operate on the
/// indexed set with word-boundary matching.
#[derive(Default)]
pub struct TextCodeModel {
    docs: DashMap<PathBuf, Document>,
}

impl TextCodeModel {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    fn word_pattern(name: &str) -> ChiselResult<Regex> {
        Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .map_err(|e| ChiselError::internal(format!("bad reference pattern for '{}': {}", name, e)))
    }

    fn ensure_writable(path: &Path) -> ChiselResult<()> {
        let meta = std::fs::metadata(path)
            .map_err(|e| ChiselError::not_found(format!("{}: {}", path.display(), e)))?;
        if meta.permissions().readonly() {
            return Err(ChiselError::not_writable(path.display().to_string()));
        }
        Ok(())
    }

    /// Re-key an indexed document after a file-level move or rename
    fn retrack(&self, old_path: &Path, new_path: &Path) {
        if let Some((_, mut doc)) = self.docs.remove(old_path) {
            doc.path = new_path.to_path_buf();
            doc.revision += 1;
            self.docs.insert(new_path.to_path_buf(), doc);
        }
    }
}

#[async_trait]
impl CodeModel for TextCodeModel {
    async fn load(&self, path: &Path) -> ChiselResult<Document> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            ChiselError::not_found(format!("file {}: {}", path.display(), e))
        })?;

        let revision = self
            .docs
            .get(path)
            .map(|existing| {
                if existing.text == text {
                    existing.revision
                } else {
                    existing.revision + 1
                }
            })
            .unwrap_or(0);

        let mut doc = Document::new(path.to_path_buf(), text);
        doc.revision = revision;
        self.docs.insert(path.to_path_buf(), doc.clone());
        debug!(path = %path.display(), revision, "Indexed document");
        Ok(doc)
    }

    async fn affected_by_rename(&self, element: &ResolvedElement) -> ChiselResult<Vec<PathBuf>> {
        if !IDENTIFIER_RE.is_match(&element.text) {
            return Ok(Vec::new());
        }
        let pattern = Self::word_pattern(&element.text)?;
        Ok(self
            .docs
            .iter()
            .filter(|entry| pattern.is_match(&entry.text))
            .map(|entry| entry.path.clone())
            .collect())
    }

    async fn rename(&self, element: &ResolvedElement, new_name: &str) -> ChiselResult<()> {
        if !IDENTIFIER_RE.is_match(new_name) {
            return Err(ChiselError::backend(format!(
                "'{}' is not a valid identifier",
                new_name
            )));
        }
        if !IDENTIFIER_RE.is_match(&element.text) {
            return Err(ChiselError::backend(format!(
                "element '{}' at {}:{} is not a renameable identifier",
                element.text,
                element.path.display(),
                element.line
            )));
        }

        let pattern = Self::word_pattern(&element.text)?;

        // Plan every edit before touching the filesystem, so a failed
        // validation leaves no partial rename behind
        let mut edits: Vec<(PathBuf, String)> = Vec::new();
        for entry in self.docs.iter() {
            if pattern.is_match(&entry.text) {
                Self::ensure_writable(&entry.path)?;
                let updated = pattern.replace_all(&entry.text, new_name).into_owned();
                edits.push((entry.path.clone(), updated));
            }
        }

        if edits.is_empty() {
            return Err(ChiselError::backend(format!(
                "no occurrences of '{}' found in indexed documents",
                element.text
            )));
        }

        for (path, updated) in edits {
            tokio::fs::write(&path, &updated).await.map_err(|e| {
                ChiselError::backend(format!("writing {}: {}", path.display(), e))
            })?;
            if let Some(mut doc) = self.docs.get_mut(&path) {
                doc.text = updated;
                doc.revision += 1;
            }
        }
        Ok(())
    }

    async fn safe_delete(&self, element: &ResolvedElement) -> ChiselResult<()> {
        let remaining = self.find_references(element).await?;
        if !remaining.is_empty() {
            return Err(ChiselError::backend(format!(
                "cannot safely delete '{}': {} usage(s) remain",
                element.text,
                remaining.len()
            )));
        }

        Self::ensure_writable(&element.path)?;
        let doc = self.load(&element.path).await?;

        // Remove the whole declaration body when the element is a scanned
        // declaration; otherwise remove just the element's span
        let span = doc
            .declarations()
            .iter()
            .find(|d| d.name_span == element.span)
            .map(|d| d.body_span)
            .unwrap_or(element.span);

        let mut text = doc.text.clone();
        text.replace_range(span.start..span.end.min(text.len()), "");
        tokio::fs::write(&element.path, &text).await.map_err(|e| {
            ChiselError::backend(format!("writing {}: {}", element.path.display(), e))
        })?;
        if let Some(mut tracked) = self.docs.get_mut(&element.path) {
            tracked.text = text;
            tracked.revision += 1;
        }
        Ok(())
    }

    async fn find_references(&self, element: &ResolvedElement) -> ChiselResult<Vec<ReferenceHit>> {
        if !IDENTIFIER_RE.is_match(&element.text) {
            return Ok(Vec::new());
        }
        let pattern = Self::word_pattern(&element.text)?;

        let mut hits = Vec::new();
        for entry in self.docs.iter() {
            for m in pattern.find_iter(&entry.text) {
                // the declaration itself is not a usage
                if entry.path == element.path && m.start() == element.span.start {
                    continue;
                }
                hits.push(ReferenceHit {
                    path: entry.path.clone(),
                    offset: m.start(),
                    text: m.as_str().to_string(),
                });
            }
        }
        Ok(hits)
    }

    async fn move_file(&self, source: &Path, dest_dir: &Path) -> ChiselResult<PathBuf> {
        if !source.exists() {
            return Err(ChiselError::not_found(format!(
                "source file {}",
                source.display()
            )));
        }
        if !dest_dir.is_dir() {
            return Err(ChiselError::not_found(format!(
                "target directory {}",
                dest_dir.display()
            )));
        }
        Self::ensure_writable(source)?;

        let file_name = source.file_name().ok_or_else(|| {
            ChiselError::invalid_request(format!("{} has no file name", source.display()))
        })?;
        let target = dest_dir.join(file_name);
        if target.exists() {
            return Err(ChiselError::invalid_request(format!(
                "destination {} already exists",
                target.display()
            )));
        }

        tokio::fs::rename(source, &target).await.map_err(|e| {
            ChiselError::backend(format!(
                "moving {} to {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })?;
        self.retrack(source, &target);
        Ok(target)
    }

    async fn rename_file(&self, source: &Path, new_name: &str) -> ChiselResult<PathBuf> {
        if !source.exists() {
            return Err(ChiselError::not_found(format!(
                "source file {}",
                source.display()
            )));
        }
        Self::ensure_writable(source)?;

        let parent = source.parent().ok_or_else(|| {
            ChiselError::invalid_request(format!("{} has no parent directory", source.display()))
        })?;
        let target = parent.join(new_name);
        if target.exists() {
            return Err(ChiselError::invalid_request(format!(
                "destination {} already exists",
                target.display()
            )));
        }

        tokio::fs::rename(source, &target).await.map_err(|e| {
            ChiselError::backend(format!(
                "renaming {} to {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })?;
        self.retrack(source, &target);
        Ok(target)
    }

    async fn delete_file(&self, path: &Path) -> ChiselResult<()> {
        if !path.exists() {
            return Err(ChiselError::not_found(format!("file {}", path.display())));
        }
        Self::ensure_writable(path)?;
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| ChiselError::backend(format!("deleting {}: {}", path.display(), e)))?;
        self.docs.remove(path);
        Ok(())
    }
}
