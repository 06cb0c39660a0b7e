use meta_graph::GraphError;
use meta_store::StoreError;
use meta_types::Address;
use meta_xml::EncodeError;

/// Errors produced by the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The cancel signal fired before the operation completed.
    #[error("ingestion cancelled")]
    Cancelled,

    /// Every receiver of the address stream has been dropped.
    #[error("address stream closed")]
    StreamClosed,

    /// No handler is registered for the object's declared type.
    #[error("no handler for type {type_id:?} (object {address})")]
    UnhandledType { type_id: String, address: Address },

    /// A handler rejected an object.
    #[error("handler for {type_id:?} failed: {reason}")]
    Handler { type_id: String, reason: String },

    /// A blocking encode task panicked or was aborted.
    #[error("encode task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

pub type IngestResult<T> = Result<T, IngestError>;
