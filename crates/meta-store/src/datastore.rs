use std::io;
use std::sync::Arc;

/// Backing key/value collaborator for a [`Store`](crate::Store).
///
/// All implementations must satisfy these invariants:
/// - Values are returned exactly as written; the backend never transforms
///   them.
/// - Writing a key that already holds the same value is a no-op.
/// - Errors are returned as `io::Error` and surface unchanged to callers of
///   the store.
///
/// There is no delete: entries are write-once.
pub trait Datastore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Write `value` under `key`.
    fn put(&self, key: &str, value: &[u8]) -> io::Result<()>;

    /// Check whether `key` exists.
    fn has(&self, key: &str) -> io::Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<D: Datastore + ?Sized> Datastore for Arc<D> {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
        (**self).put(key, value)
    }

    fn has(&self, key: &str) -> io::Result<bool> {
        (**self).has(key)
    }
}

impl<D: Datastore + ?Sized> Datastore for &D {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
        (**self).put(key, value)
    }

    fn has(&self, key: &str) -> io::Result<bool> {
        (**self).has(key)
    }
}
