use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// The only address format version this system derives or accepts.
pub const ADDRESS_VERSION: u8 = 1;

/// Length in bytes of a digest produced by every supported hash function.
pub const DIGEST_LEN: usize = 32;

/// Prefix character of the canonical string form.
const STRING_PREFIX: char = 'm';

/// Length of the binary form: version, codec, hash, digest length, digest.
const BINARY_LEN: usize = 4 + DIGEST_LEN;

/// Encoding of the bytes an address refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Codec {
    /// Opaque bytes with no decodable structure.
    Raw = 0x55,
    /// Canonical binary node tree (the encoding META objects use).
    Node = 0x6d,
}

impl Codec {
    /// Numeric codec id as it appears in the binary form.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a codec by its numeric id.
    pub fn from_code(code: u8) -> Result<Self, TypeError> {
        match code {
            0x55 => Ok(Self::Raw),
            0x6d => Ok(Self::Node),
            other => Err(TypeError::UnknownCodec(other)),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Node => write!(f, "node"),
        }
    }
}

/// Hash function that produced an address digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum HashFunction {
    /// BLAKE3 with a 32-byte output.
    Blake3 = 0x1e,
}

impl HashFunction {
    /// Numeric hash function id as it appears in the binary form.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a hash function by its numeric id.
    pub fn from_code(code: u8) -> Result<Self, TypeError> {
        match code {
            0x1e => Ok(Self::Blake3),
            other => Err(TypeError::UnknownHashFunction(other)),
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Self-describing content address.
///
/// An `Address` is derived from an object's bytes and doubles as the
/// object's storage key and its integrity proof. It records which codec the
/// bytes use and which hash function produced the digest, so readers can
/// re-derive it from the bytes and reject anything that does not match.
///
/// Parsing accepts any version byte so that addresses from other format
/// versions can be represented and rejected explicitly by block
/// construction; derivation only ever produces [`ADDRESS_VERSION`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    version: u8,
    codec: Codec,
    hash: HashFunction,
    digest: [u8; DIGEST_LEN],
}

impl Address {
    /// Build an address at the current format version.
    pub fn new(codec: Codec, hash: HashFunction, digest: [u8; DIGEST_LEN]) -> Self {
        Self::with_version(ADDRESS_VERSION, codec, hash, digest)
    }

    /// Build an address with an explicit format version.
    pub fn with_version(
        version: u8,
        codec: Codec,
        hash: HashFunction,
        digest: [u8; DIGEST_LEN],
    ) -> Self {
        Self {
            version,
            codec,
            hash,
            digest,
        }
    }

    /// Address format version.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Codec of the addressed bytes.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Hash function that produced the digest.
    pub fn hash_function(&self) -> HashFunction {
        self.hash
    }

    /// The raw digest.
    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Binary form: `[version, codec, hash, digest_len, digest...]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BINARY_LEN);
        out.push(self.version);
        out.push(self.codec.code());
        out.push(self.hash.code());
        out.push(DIGEST_LEN as u8);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parse the binary form produced by [`Address::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != BINARY_LEN {
            return Err(TypeError::InvalidLength {
                expected: BINARY_LEN,
                actual: bytes.len(),
            });
        }
        let codec = Codec::from_code(bytes[1])?;
        let hash = HashFunction::from_code(bytes[2])?;
        if bytes[3] as usize != DIGEST_LEN {
            return Err(TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: bytes[3] as usize,
            });
        }
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&bytes[4..]);
        Ok(Self::with_version(bytes[0], codec, hash, digest))
    }

    /// Short hex of the digest (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..4])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}:{})", self.codec, self.short_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{STRING_PREFIX}{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix(STRING_PREFIX).ok_or(TypeError::MissingPrefix {
            expected: STRING_PREFIX,
        })?;
        let bytes = hex::decode(body).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.to_bytes())
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AddressVisitor;

        impl<'de> Visitor<'de> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a META address string or its binary form")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Address, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Address, E> {
                Address::from_bytes(v).map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(AddressVisitor)
        } else {
            deserializer.deserialize_bytes(AddressVisitor)
        }
    }
}
