//! Content address derivation for META.
//!
//! Provides domain-separated BLAKE3 hashing that turns a byte sequence and
//! its codec into a META [`Address`](meta_types::Address).
//!
//! All crypto operations wrap established libraries, no custom cryptography.

pub mod hasher;

pub use hasher::{derive_address, AddressHasher};
