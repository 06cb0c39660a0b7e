//! Error types for graph resolution.

use meta_store::StoreError;

/// Errors that can occur while resolving a path.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A path segment does not exist.
    #[error("path not found: {}", path.join("/"))]
    PathNotFound {
        /// The full path that was requested.
        path: Vec<String>,
    },

    /// The path continues past a value that is not a link.
    #[error("expected link before segment {segment:?}, found {found}")]
    ExpectedLink {
        /// The first segment that could not be followed.
        segment: String,
        /// Kind of the value found instead.
        found: &'static str,
    },

    /// The path followed more links than allowed.
    #[error("link depth limit of {limit} exceeded")]
    DepthExceeded {
        /// The configured hop limit.
        limit: usize,
    },

    /// Fetching a linked object failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GraphError {
    /// Returns `true` if the requested path is simply absent, which callers
    /// treat as "nothing here" rather than a failure.
    pub fn is_path_not_found(&self) -> bool {
        match self {
            Self::PathNotFound { .. } => true,
            Self::Store(e) => e.is_path_not_found(),
            _ => false,
        }
    }
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
