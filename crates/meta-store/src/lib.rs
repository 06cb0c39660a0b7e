//! Content-addressed object storage for META.
//!
//! Every distinguishable piece of an ingested document is stored as an
//! immutable object identified by its [`Address`](meta_types::Address). The
//! address is re-derived from the bytes whenever an object is constructed, so
//! corrupted or foreign bytes are rejected before anything reads them.
//!
//! # Layers
//!
//! - [`Block`] -- raw bytes validated against a claimed address
//! - [`Node`] -- canonical value tree and its binary encoding
//! - [`Object`] -- typed, navigable view over a block's node tree
//! - [`Store`] -- address-keyed object access over a [`Datastore`]
//!
//! # Storage Backends
//!
//! All backends implement the [`Datastore`] trait:
//!
//! - [`InMemoryDatastore`] -- `HashMap`-based backend for tests and embedding
//! - [`FsDatastore`] -- one file per entry under a root directory
//!
//! # Design Rules
//!
//! 1. Objects are immutable once constructed; there is no update or delete.
//! 2. Children are written before the parents that link to them.
//! 3. Addresses are verified on read, never on write.
//! 4. The backend never interprets or transforms values.
//! 5. Backend I/O errors are propagated verbatim, never silently ignored.

pub mod block;
pub mod datastore;
pub mod error;
pub mod fs;
pub mod memory;
pub mod node;
pub mod object;
pub mod store;
pub mod value;

// Re-export primary types at crate root for ergonomic imports.
pub use block::Block;
pub use datastore::Datastore;
pub use error::{StoreError, StoreResult};
pub use fs::FsDatastore;
pub use memory::InMemoryDatastore;
pub use node::{Node, MAX_NODE_DEPTH};
pub use object::{Object, TYPE_FIELD, VALUE_FIELD};
pub use store::Store;
pub use value::encode_value;
