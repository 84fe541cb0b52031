//! chisel-model: code model adapter and symbol locator
//!
//! This crate owns the seam between the protocol layer and the semantic
//! backend. It provides:
//! - [`Document`]: a loaded source file with declaration scanning
//! - [`Locator`] / [`ResolvedElement`]: locating strategies and their results
//! - [`CodeModel`]: the pluggable backend trait all mutations delegate to
//! - [`TextCodeModel`]: the bundled text-based backend
//! - [`DocumentLocks`]: per-document single-writer locking

pub mod backend;
pub mod document;
pub mod locator;
pub mod locks;

pub use backend::{CodeModel, ReferenceHit, TextCodeModel};
pub use document::{Declaration, Document, Span};
pub use locator::{resolve, ElementKind, Locator, ResolvedElement};
pub use locks::DocumentLocks;
