use meta_types::{Address, Codec};

/// Errors from block, object and store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The address uses a format version this system does not support.
    #[error("unsupported address version {version} (supported: {supported})")]
    InvalidVersion { version: u8, supported: u8 },

    /// The bytes do not hash to the claimed address.
    #[error("address mismatch: claimed {claimed}, derived {derived}")]
    AddressMismatch { claimed: Address, derived: Address },

    /// The bytes claim an encoding objects cannot be decoded from.
    #[error("invalid codec {0}: objects must use the node codec")]
    InvalidCodec(Codec),

    /// The encoded content is malformed.
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoding a node tree failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The `@type` field is present but is not a string.
    #[error("invalid @type field: expected string, got {0}")]
    InvalidType(&'static str),

    /// A path segment does not exist in the object.
    #[error("path not found: {}", path.join("/"))]
    PathNotFound { path: Vec<String> },

    /// No entry is stored under the address.
    #[error("object not found: {0}")]
    NotFound(Address),

    /// I/O error from the underlying datastore.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for the one condition callers are expected to branch
    /// on: a path segment that is simply absent.
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
