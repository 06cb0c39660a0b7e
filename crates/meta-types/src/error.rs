use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("address string must start with '{expected}'")]
    MissingPrefix { expected: char },

    #[error("unknown codec id {0:#04x}")]
    UnknownCodec(u8),

    #[error("unknown hash function id {0:#04x}")]
    UnknownHashFunction(u8),
}
