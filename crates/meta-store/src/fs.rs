use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::datastore::Datastore;

/// Filesystem datastore: one file per entry under a root directory.
///
/// Entries are sharded into subdirectories named after the last two
/// characters of the key (the leading characters of an address string are
/// its constant header). Writes go to a temporary file in the root first and
/// are renamed into place, so readers never observe a partially written
/// entry.
#[derive(Clone, Debug)]
pub struct FsDatastore {
    root: PathBuf,
}

impl FsDatastore {
    /// Open (creating if needed) a datastore rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of the datastore.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> io::Result<PathBuf> {
        let valid = key.len() >= 2
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid datastore key {key:?}"),
            ));
        }
        let shard = &key[key.len() - 2..];
        Ok(self.root.join(shard).join(key))
    }
}

impl Datastore for FsDatastore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.entry_path(key)?;
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(key, bytes = value.len(), "wrote datastore entry");
        Ok(())
    }

    fn has(&self, key: &str) -> io::Result<bool> {
        Ok(self.entry_path(key)?.exists())
    }
}
