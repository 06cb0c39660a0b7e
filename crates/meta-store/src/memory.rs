use std::collections::HashMap;
use std::io;
use std::sync::RwLock;

use crate::datastore::Datastore;

/// In-memory, HashMap-based datastore.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock` for
/// safe concurrent access and are cloned on read/write.
pub struct InMemoryDatastore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryDatastore {
    /// Create a new empty datastore.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of all keys.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Overwrite an entry in place, bypassing write-once semantics.
    ///
    /// Only for simulating backend corruption in tests.
    #[doc(hidden)]
    pub fn corrupt(&self, key: &str, value: Vec<u8>) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key.to_owned(), value);
    }
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for InMemoryDatastore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        // Keys are content addresses, so an existing entry already holds
        // these bytes.
        map.entry(key.to_owned()).or_insert_with(|| value.to_vec());
        Ok(())
    }

    fn has(&self, key: &str) -> io::Result<bool> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDatastore")
            .field("entry_count", &self.len())
            .finish()
    }
}
