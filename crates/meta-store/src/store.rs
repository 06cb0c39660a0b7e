use tracing::debug;

use meta_types::Address;

use crate::datastore::Datastore;
use crate::error::{StoreError, StoreResult};
use crate::object::Object;

/// Address-keyed object storage over a [`Datastore`].
///
/// The key of every entry is the address's string form and the value is the
/// object's raw bytes. Addresses are re-derived on every read, so corruption
/// introduced by the backend is caught here. Writes trust the object, which
/// is already known to be valid.
#[derive(Clone, Debug)]
pub struct Store<D> {
    backend: D,
}

impl<D: Datastore> Store<D> {
    /// Create a store over a backend.
    pub fn new(backend: D) -> Self {
        Self { backend }
    }

    /// The backing datastore.
    pub fn backend(&self) -> &D {
        &self.backend
    }

    /// Fetch and verify the object stored under `address`.
    pub fn get(&self, address: &Address) -> StoreResult<Object> {
        let data = self
            .backend
            .get(&key(address))?
            .ok_or(StoreError::NotFound(*address))?;
        Object::new(*address, data)
    }

    /// Write an object. Idempotent for identical content.
    pub fn put(&self, object: &Object) -> StoreResult<()> {
        self.backend.put(&key(object.address()), object.raw_data())?;
        debug!(
            address = %object.address().short_hex(),
            typ = object.type_name(),
            bytes = object.raw_data().len(),
            "put object"
        );
        Ok(())
    }

    /// Check whether an entry exists under `address` (without verifying it).
    pub fn has(&self, address: &Address) -> StoreResult<bool> {
        Ok(self.backend.has(&key(address))?)
    }
}

fn key(address: &Address) -> String {
    address.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io;

    use meta_crypto::derive_address;
    use meta_types::Codec;

    use crate::fs::FsDatastore;
    use crate::memory::InMemoryDatastore;
    use crate::node::Node;
    use crate::object::{TYPE_FIELD, VALUE_FIELD};

    fn make_object(value: &str) -> Object {
        let mut map = BTreeMap::new();
        map.insert(TYPE_FIELD.to_string(), Node::from("Title"));
        map.insert(VALUE_FIELD.to_string(), Node::from(value));
        Object::from_node(Node::Map(map)).unwrap()
    }

    struct FailingDatastore;

    impl Datastore for FailingDatastore {
        fn get(&self, _key: &str) -> io::Result<Option<Vec<u8>>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn put(&self, _key: &str, _value: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::WriteZero, "full"))
        }
    }

    #[test]
    fn put_then_get_roundtrip() {
        let store = Store::new(InMemoryDatastore::new());
        let obj = make_object("Song Title");
        store.put(&obj).unwrap();

        let read_back = store.get(obj.address()).unwrap();
        assert_eq!(read_back.raw_data(), obj.raw_data());
        assert_eq!(read_back.type_name(), obj.type_name());
    }

    #[test]
    fn key_is_address_string() {
        let store = Store::new(InMemoryDatastore::new());
        let obj = make_object("x");
        store.put(&obj).unwrap();
        assert_eq!(store.backend().keys(), vec![obj.address().to_string()]);
    }

    #[test]
    fn put_is_idempotent() {
        let store = Store::new(InMemoryDatastore::new());
        let obj = make_object("same");
        store.put(&obj).unwrap();
        store.put(&obj).unwrap();
        assert_eq!(store.backend().len(), 1);
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = Store::new(InMemoryDatastore::new());
        let addr = derive_address(b"nothing", Codec::Node);
        assert!(matches!(store.get(&addr), Err(StoreError::NotFound(a)) if a == addr));
        assert!(!store.has(&addr).unwrap());
    }

    #[test]
    fn backend_corruption_detected_on_read() {
        let store = Store::new(InMemoryDatastore::new());
        let obj = make_object("original");
        store.put(&obj).unwrap();
        store
            .backend()
            .corrupt(&obj.address().to_string(), make_object("forged").raw_data().to_vec());

        let err = store.get(obj.address()).unwrap_err();
        assert!(matches!(err, StoreError::AddressMismatch { .. }));
    }

    #[test]
    fn backend_errors_propagate_verbatim() {
        let store = Store::new(FailingDatastore);
        let obj = make_object("x");
        match store.put(&obj).unwrap_err() {
            StoreError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
            other => panic!("unexpected error: {other}"),
        }
        match store.get(obj.address()).unwrap_err() {
            StoreError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn filesystem_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(FsDatastore::open(dir.path()).unwrap());
        let obj = make_object("on disk");
        store.put(&obj).unwrap();
        assert!(store.has(obj.address()).unwrap());
        assert_eq!(store.get(obj.address()).unwrap(), obj);
    }
}
