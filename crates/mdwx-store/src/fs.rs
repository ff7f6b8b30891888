//! Filesystem-backed note store.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tracing::debug;

use crate::{NoteStore, StoreError};

/// Characters percent-encoded in resource URLs beyond controls.
const RESOURCE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?');

/// Note store over a directory tree.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the collection.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Enumerate all files under the root as collection-relative paths.
    fn scan(&self) -> Vec<String> {
        let pattern = self.root.join("**/*");
        let Some(pattern) = pattern.to_str() else {
            return Vec::new();
        };
        let Ok(entries) = glob::glob(pattern) else {
            return Vec::new();
        };

        entries
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .filter_map(|p| {
                p.strip_prefix(&self.root)
                    .ok()
                    .and_then(Path::to_str)
                    .map(|s| s.replace('\\', "/"))
            })
            .collect()
    }
}

impl NoteStore for FsStore {
    fn read_note(&self, path: &str) -> Result<String, StoreError> {
        let abs = self.absolute(path);
        if !abs.is_file() {
            return Err(StoreError::NotFound { path: path.into() });
        }
        Ok(std::fs::read_to_string(abs)?)
    }

    fn write_note(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let abs = self.absolute(path);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(abs, content)?;
        Ok(())
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let abs = self.absolute(path);
        if !abs.is_file() {
            return Err(StoreError::NotFound { path: path.into() });
        }
        Ok(std::fs::read(abs)?)
    }

    fn resolve_attachment(&self, name: &str) -> Option<String> {
        let files = self.scan();
        let suffix = format!("/{name}");

        let resolved = files
            .iter()
            .find(|p| file_name(p) == name)
            .or_else(|| files.iter().find(|p| p.as_str() == name))
            .or_else(|| files.iter().find(|p| p.ends_with(&suffix)));

        if resolved.is_none() {
            debug!("attachment '{name}' not found in {}", self.root.display());
        }
        resolved.cloned()
    }

    fn resource_url(&self, path: &str) -> String {
        let abs = self.absolute(path);
        let abs = abs.to_string_lossy().replace('\\', "/");
        format!("file://{}", utf8_percent_encode(&abs, RESOURCE_SET))
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
