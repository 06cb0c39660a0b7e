//! Foundation types for META.
//!
//! Every META object is identified by an [`Address`]: a self-describing
//! identifier carrying the address format version, the codec the object's
//! bytes are encoded with, the hash function used and the digest itself.
//! Every other META crate depends on `meta-types`.
//!
//! # Key Types
//!
//! - [`Address`]: Content address (version + codec + hash function + digest)
//! - [`Codec`]: Encoding of the addressed bytes
//! - [`HashFunction`]: Hash function that produced the digest

pub mod address;
pub mod error;

pub use address::{Address, Codec, HashFunction, ADDRESS_VERSION, DIGEST_LEN};
pub use error::TypeError;
