//! Loaded documents and declaration scanning
//!
//! The scanner recognizes a fixed set of declaration keywords across the
//! common curly-brace and offside-rule languages. It is deliberately not a
//! parser: the semantic backend owns real syntax; this layer only needs
//! enough structure to locate a named declaration by offset or name.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

/// Declaration keywords the scanner recognizes
///
/// An explicit list instead of reflective type filtering: adding a node
/// variant means adding a keyword here.
const DECLARATION_KEYWORDS: &str =
    "class|struct|enum|trait|interface|fn|func|function|def|type|mod|module|object|const|let|var|val";

static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)\b(?:{})\s+([A-Za-z_][A-Za-z0-9_]*)",
        DECLARATION_KEYWORDS
    ))
    .unwrap_or_else(|e| panic!("invalid declaration pattern: {}", e))
});

/// Byte range within a document's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// A named declaration found by the scanner
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Identifier text
    pub name: String,
    /// Span of the identifier itself
    pub name_span: Span,
    /// Span from the declaration keyword to the start of the next
    /// declaration (or end of file)
    pub body_span: Span,
    /// 1-based line of the declaration
    pub line: u32,
}

/// A live handle on one source file tracked by the code model
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
    /// Bumped on every committed mutation; readers can detect staleness
    pub revision: u64,
}

impl Document {
    pub fn new(path: PathBuf, text: String) -> Self {
        Self {
            path,
            text,
            revision: 0,
        }
    }

    /// Convert a byte offset into 1-based (line, column)
    pub fn position_of(&self, offset: usize) -> (u32, u32) {
        let clamped = offset.min(self.text.len());
        let before = &self.text[..clamped];
        let line = before.bytes().filter(|b| *b == b'\n').count() as u32 + 1;
        let column = match before.rfind('\n') {
            Some(nl) => (clamped - nl) as u32,
            None => clamped as u32 + 1,
        };
        (line, column)
    }

    /// Full text of a 1-based line, trimmed of surrounding whitespace
    pub fn line_snippet(&self, line: u32) -> Option<String> {
        self.text
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .map(|l| l.trim().to_string())
    }

    /// Scan the document for named declarations, in traversal order
    pub fn declarations(&self) -> Vec<Declaration> {
        let mut found = Vec::new();
        let matches: Vec<_> = DECLARATION_RE.captures_iter(&self.text).collect();
        for (i, caps) in matches.iter().enumerate() {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let name = match caps.get(1) {
                Some(m) => m,
                None => continue,
            };
            let body_end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(self.text.len());
            let (line, _) = self.position_of(name.start());
            found.push(Declaration {
                name: name.as_str().to_string(),
                name_span: Span::new(name.start(), name.end()),
                body_span: Span::new(whole.start(), body_end),
                line,
            });
        }
        found
    }

    /// Identifier token covering `offset`, if any
    ///
    /// Also accepts an offset one past the identifier's end, since prefix
    /// offsets frequently land on the boundary.
    pub fn identifier_at(&self, offset: usize) -> Option<Span> {
        let bytes = self.text.as_bytes();
        let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

        let anchor = if offset < bytes.len() && is_ident(bytes[offset]) {
            offset
        } else if offset > 0 && offset <= bytes.len() && is_ident(bytes[offset - 1]) {
            offset - 1
        } else {
            return None;
        };

        let mut start = anchor;
        while start > 0 && is_ident(bytes[start - 1]) {
            start -= 1;
        }
        let mut end = anchor + 1;
        while end < bytes.len() && is_ident(bytes[end]) {
            end += 1;
        }
        // identifiers cannot start with a digit
        if bytes[start].is_ascii_digit() {
            return None;
        }
        Some(Span::new(start, end))
    }

    /// Text slice for a span
    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.start.min(self.text.len())..span.end.min(self.text.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        Document::new(PathBuf::from("/tmp/test.src"), text.to_string())
    }

    #[test]
    fn positions_are_one_based() {
        let d = doc("abc\ndef\n");
        assert_eq!(d.position_of(0), (1, 1));
        assert_eq!(d.position_of(2), (1, 3));
        assert_eq!(d.position_of(4), (2, 1));
        assert_eq!(d.position_of(6), (2, 3));
    }

    #[test]
    fn scans_declarations_with_spans() {
        let d = doc("class Foo {}\n\nfn bar() {}\n");
        let decls = d.declarations();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "Foo");
        assert_eq!(d.slice(decls[0].name_span), "Foo");
        assert_eq!(decls[0].line, 1);
        assert_eq!(decls[1].name, "bar");
        assert_eq!(decls[1].line, 3);
        // first body span ends where the second declaration starts
        assert_eq!(decls[0].body_span.end, decls[1].body_span.start);
        assert_eq!(decls[1].body_span.end, d.text.len());
    }

    #[test]
    fn identifier_at_offset_and_boundary() {
        let d = doc("class C {}");
        // directly on the identifier
        assert_eq!(d.identifier_at(6), Some(Span::new(6, 7)));
        // one past the end of the identifier
        assert_eq!(d.identifier_at(7), Some(Span::new(6, 7)));
        // on whitespace with no adjacent identifier to the left
        assert_eq!(d.identifier_at(9), None);
    }

    #[test]
    fn line_snippet_is_trimmed() {
        let d = doc("  indented line  \nnext\n");
        assert_eq!(d.line_snippet(1).as_deref(), Some("indented line"));
        assert_eq!(d.line_snippet(3), None);
    }
}
