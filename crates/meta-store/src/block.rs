use meta_crypto::derive_address;
use meta_types::{Address, Codec, ADDRESS_VERSION};

use crate::error::{StoreError, StoreResult};

/// Raw bytes validated against a claimed address.
///
/// A `Block` can only be obtained through [`Block::new`], which re-derives
/// the address from the bytes. Holding a `Block` therefore proves that its
/// bytes hash to its address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    address: Address,
    data: Vec<u8>,
}

impl Block {
    /// Validate `data` against `address`.
    ///
    /// Fails with [`StoreError::InvalidVersion`] for any address version other
    /// than [`ADDRESS_VERSION`], and with [`StoreError::AddressMismatch`] when
    /// the bytes derive a different address under the claimed codec.
    pub fn new(address: Address, data: Vec<u8>) -> StoreResult<Self> {
        if address.version() != ADDRESS_VERSION {
            return Err(StoreError::InvalidVersion {
                version: address.version(),
                supported: ADDRESS_VERSION,
            });
        }
        let derived = derive_address(&data, address.codec());
        if derived != address {
            return Err(StoreError::AddressMismatch {
                claimed: address,
                derived,
            });
        }
        Ok(Self { address, data })
    }

    /// Derive the address of `data` and wrap both.
    pub fn from_data(data: Vec<u8>, codec: Codec) -> Self {
        let address = derive_address(&data, codec);
        Self { address, data }
    }

    /// The verified address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The raw bytes.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Codec of the bytes.
    pub fn codec(&self) -> Codec {
        self.address.codec()
    }
}
