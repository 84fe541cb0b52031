//! Error handling for the chisel refactoring server

use thiserror::Error;

/// Core error type used throughout the chisel system
///
/// Resolution and adapter failures short-circuit before any mutation is
/// attempted; backend failures keep the backend's message verbatim so the
/// caller can diagnose without log access.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChiselError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Ambiguous symbol '{name}': {candidates} candidates, no line number given. {listing}")]
    Ambiguous {
        name: String,
        candidates: usize,
        /// Human-readable enumeration of candidate lines/offsets
        listing: String,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Not writable: {path}")]
    NotWritable { path: String },

    #[error("Backend failure: {message}")]
    Backend { message: String },

    #[error("Timeout during: {operation}")]
    Timeout { operation: String },

    #[error("Bind failure: {message}")]
    Bind { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ChiselError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new ambiguous-symbol error with a candidate listing
    pub fn ambiguous(name: impl Into<String>, candidates: usize, listing: impl Into<String>) -> Self {
        Self::Ambiguous {
            name: name.into(),
            candidates,
            listing: listing.into(),
        }
    }

    /// Create a new invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new not-writable error
    pub fn not_writable(path: impl Into<String>) -> Self {
        Self::NotWritable { path: path.into() }
    }

    /// Create a new backend failure, preserving the backend's message verbatim
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a new bind failure error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type ChiselResult<T> = Result<T, ChiselError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_preserved_verbatim() {
        let original = "refactoring engine rejected rename: symbol is external";
        let err = ChiselError::backend(original);
        assert_eq!(err.to_string(), format!("Backend failure: {}", original));
    }

    #[test]
    fn ambiguous_lists_candidates() {
        let err = ChiselError::ambiguous("foo", 3, "line 4 (offset 12), line 9 (offset 88), line 21 (offset 301)");
        let msg = err.to_string();
        assert!(msg.contains("'foo'"));
        assert!(msg.contains("3 candidates"));
        assert!(msg.contains("line 21"));
    }
}
