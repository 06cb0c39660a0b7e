//! Error types for canonicalization.

use meta_store::StoreError;
use meta_types::Address;

/// Errors that abort encoding a document.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The XML is not well formed.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document structure cannot be encoded.
    #[error("malformed document: {0}")]
    Document(String),

    /// An element or attribute uses an undeclared namespace prefix.
    #[error("unknown namespace prefix {0:?}")]
    UnknownPrefix(String),

    /// The input contains no root element.
    #[error("document has no root element")]
    EmptyDocument,

    /// No context maps the name to a type identifier.
    #[error("no context provides a type for {name:?}")]
    MissingContext { name: String },

    /// A context address could not be loaded from the store.
    #[error("context {address} unavailable: {source}")]
    ContextUnavailable {
        address: Address,
        #[source]
        source: StoreError,
    },

    /// A context object does not have the context document shape.
    #[error("invalid context document {address}: {reason}")]
    InvalidContext { address: Address, reason: String },

    /// A child element and an attribute map to the same field.
    #[error("element {element:?}: field {field:?} is both an attribute and a child element")]
    FieldConflict { element: String, field: String },

    /// Element nesting exceeds the configured limit.
    #[error("element nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    /// An object does not have a leaf or composite shape.
    #[error("unexpected object shape: {0}")]
    UnexpectedShape(String),

    /// Encoding or persisting an object failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for encoding results.
pub type EncodeResult<T> = Result<T, EncodeError>;
