//! In-memory note store for tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::{NoteStore, StoreError};

/// In-memory store backed by a path → bytes map.
///
/// Available behind the `mock` feature. Paths resolve with the same
/// name/path/suffix order as [`FsStore`](crate::FsStore).
#[derive(Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the store.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.files
            .write()
            .expect("store lock poisoned")
            .insert(path.to_owned(), data.into());
    }

    fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .expect("store lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl NoteStore for MemoryStore {
    fn read_note(&self, path: &str) -> Result<String, StoreError> {
        let bytes = self.read_binary(path)?;
        String::from_utf8(bytes).map_err(|_| StoreError::NotFound { path: path.into() })
    }

    fn write_note(&self, path: &str, content: &str) -> Result<(), StoreError> {
        self.insert(path, content.as_bytes().to_vec());
        Ok(())
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.files
            .read()
            .expect("store lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { path: path.into() })
    }

    fn resolve_attachment(&self, name: &str) -> Option<String> {
        let paths = self.paths();
        let suffix = format!("/{name}");

        paths
            .iter()
            .find(|p| p.rsplit('/').next() == Some(name))
            .or_else(|| paths.iter().find(|p| p.as_str() == name))
            .or_else(|| paths.iter().find(|p| p.ends_with(&suffix)))
            .cloned()
    }

    fn resource_url(&self, path: &str) -> String {
        format!("mem://{path}")
    }
}
