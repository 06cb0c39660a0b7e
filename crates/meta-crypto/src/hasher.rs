use meta_types::{Address, Codec, HashFunction};

/// Domain-separated BLAKE3 address hasher.
///
/// Each hasher carries a domain tag (e.g. `"meta-node-v1"`) that is prepended
/// to every hash computation, so identical bytes claimed under two different
/// codecs never share an address.
pub struct AddressHasher {
    codec: Codec,
    domain: &'static str,
}

impl AddressHasher {
    /// Hasher for canonical node-tree objects.
    pub const NODE: Self = Self {
        codec: Codec::Node,
        domain: "meta-node-v1",
    };
    /// Hasher for opaque raw blocks.
    pub const RAW: Self = Self {
        codec: Codec::Raw,
        domain: "meta-raw-v1",
    };

    /// The hasher responsible for a codec.
    pub fn for_codec(codec: Codec) -> &'static Self {
        match codec {
            Codec::Node => &Self::NODE,
            Codec::Raw => &Self::RAW,
        }
    }

    /// Derive the address of `data`.
    pub fn derive(&self, data: &[u8]) -> Address {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Address::new(self.codec, HashFunction::Blake3, *hasher.finalize().as_bytes())
    }

    /// Verify that `data` derives exactly the `expected` address.
    pub fn verify(&self, data: &[u8], expected: &Address) -> bool {
        self.derive(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Derive the address of `data` under `codec`. Pure and deterministic.
pub fn derive_address(data: &[u8], codec: Codec) -> Address {
    AddressHasher::for_codec(codec).derive(data)
}
