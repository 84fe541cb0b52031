//! Locating strategies and symbol resolution
//!
//! Resolving to the wrong element in a rename or delete is destructive, so
//! every ambiguous or empty resolution is reported as an error, never
//! silently defaulted.

use crate::document::{Declaration, Document, Span};
use chisel_foundation::{ChiselError, ChiselResult};
use std::path::PathBuf;

/// How to find a target element in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Exact byte offset into the document text
    ByOffset { offset: usize },
    /// Offset computed as the length of the literal source text preceding
    /// the symbol; avoids off-by-one and encoding mismatches on the client
    ByPrefixLength { prefix_text: String },
    /// Locate by identifier text, disambiguated by the closest declaration
    /// line when several declarations share the name
    ByNameAndLine {
        name: String,
        approximate_line: Option<u32>,
    },
}

/// Classification of a resolved element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A named declaration recognized by the scanner
    Declaration,
    /// A generic leaf node (identifier or raw token)
    Node,
}

/// A located element, scoped to one request
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub path: PathBuf,
    pub span: Span,
    pub text: String,
    pub kind: ElementKind,
    /// 1-based line of the element
    pub line: u32,
}

impl ResolvedElement {
    fn from_declaration(doc: &Document, decl: &Declaration) -> Self {
        Self {
            path: doc.path.clone(),
            span: decl.name_span,
            text: decl.name.clone(),
            kind: ElementKind::Declaration,
            line: decl.line,
        }
    }

    fn from_leaf(doc: &Document, span: Span) -> Self {
        let (line, _) = doc.position_of(span.start);
        Self {
            path: doc.path.clone(),
            span,
            text: doc.slice(span).to_string(),
            kind: ElementKind::Node,
            line,
        }
    }
}

fn is_declaration_keyword(token: &str) -> bool {
    matches!(
        token,
        "class"
            | "struct"
            | "enum"
            | "trait"
            | "interface"
            | "fn"
            | "func"
            | "function"
            | "def"
            | "type"
            | "mod"
            | "module"
            | "object"
            | "const"
            | "let"
            | "var"
            | "val"
    )
}

/// Resolve a locator against a document
pub fn resolve(doc: &Document, locator: &Locator) -> ChiselResult<ResolvedElement> {
    match locator {
        Locator::ByOffset { offset } => resolve_at_offset(doc, *offset),
        Locator::ByPrefixLength { prefix_text } => resolve_at_offset(doc, prefix_text.len()),
        Locator::ByNameAndLine {
            name,
            approximate_line,
        } => resolve_by_name(doc, name, *approximate_line),
    }
}

fn resolve_at_offset(doc: &Document, offset: usize) -> ChiselResult<ResolvedElement> {
    if offset > doc.text.len() {
        return Err(ChiselError::not_found(format!(
            "offset {} is past the end of {} ({} bytes)",
            offset,
            doc.path.display(),
            doc.text.len()
        )));
    }

    let decls = doc.declarations();

    if let Some(span) = doc.identifier_at(offset) {
        let token = doc.slice(span);

        // Exact hit on a declaration's name
        if let Some(decl) = decls.iter().find(|d| d.name_span == span) {
            return Ok(ResolvedElement::from_declaration(doc, decl));
        }

        // A declaration keyword is an insignificant leaf; walk out to the
        // declaration it introduces
        if is_declaration_keyword(token) {
            if let Some(decl) = enclosing_declaration(&decls, offset) {
                return Ok(ResolvedElement::from_declaration(doc, decl));
            }
        }

        // Plain identifier leaf
        return Ok(ResolvedElement::from_leaf(doc, span));
    }

    // Offset landed on whitespace or punctuation; walk up to the nearest
    // enclosing named declaration
    if let Some(decl) = enclosing_declaration(&decls, offset) {
        return Ok(ResolvedElement::from_declaration(doc, decl));
    }

    // No enclosing declaration: fall back to the raw leaf, if there is one
    if let Some(span) = raw_token_at(doc, offset) {
        return Ok(ResolvedElement::from_leaf(doc, span));
    }

    Err(ChiselError::not_found(format!(
        "no element at offset {} in {}",
        offset,
        doc.path.display()
    )))
}

/// Smallest declaration body containing the offset
fn enclosing_declaration(decls: &[Declaration], offset: usize) -> Option<&Declaration> {
    decls
        .iter()
        .filter(|d| d.body_span.contains(offset))
        .min_by_key(|d| d.body_span.end - d.body_span.start)
}

/// Contiguous non-whitespace run covering the offset
fn raw_token_at(doc: &Document, offset: usize) -> Option<Span> {
    let bytes = doc.text.as_bytes();
    if offset >= bytes.len() || bytes[offset].is_ascii_whitespace() {
        return None;
    }
    let mut start = offset;
    while start > 0 && !bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    let mut end = offset + 1;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
        end += 1;
    }
    Some(Span::new(start, end))
}

fn resolve_by_name(
    doc: &Document,
    name: &str,
    approximate_line: Option<u32>,
) -> ChiselResult<ResolvedElement> {
    let decls = doc.declarations();
    let candidates: Vec<&Declaration> = decls.iter().filter(|d| d.name == name).collect();

    match (candidates.len(), approximate_line) {
        (0, _) => Err(ChiselError::not_found(format!(
            "no declaration named '{}' in {}",
            name,
            doc.path.display()
        ))),
        (1, _) => Ok(ResolvedElement::from_declaration(doc, candidates[0])),
        (_, Some(line)) => {
            // Minimal line distance; ties go to the first in traversal order
            let best = candidates
                .iter()
                .min_by_key(|d| (d.line as i64 - line as i64).unsigned_abs())
                .unwrap_or(&candidates[0]);
            Ok(ResolvedElement::from_declaration(doc, best))
        }
        (n, None) => {
            let listing = candidates
                .iter()
                .map(|d| format!("line {} (offset {})", d.line, d.name_span.start))
                .collect::<Vec<_>>()
                .join(", ");
            Err(ChiselError::ambiguous(name, n, listing))
        }
    }
}
