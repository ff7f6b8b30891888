//! Note and attachment storage for mdwx.
//!
//! Provides the [`NoteStore`] trait for abstracting access to a note
//! collection, along with [`FsStore`] for on-disk collections and, behind the
//! `mock` feature, [`MemoryStore`] for tests.
//!
//! # Path Convention
//!
//! All path parameters are collection-relative paths with `/` separators
//! (e.g., `posts/release.md`, `attachments/cover.png`). Attachment lookup by
//! bare name is handled by [`NoteStore::resolve_attachment`].

mod fs;
#[cfg(feature = "mock")]
mod memory;

pub use fs::FsStore;
#[cfg(feature = "mock")]
pub use memory::MemoryStore;

/// Error from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced note or attachment does not exist.
    #[error("file not found: {path}")]
    NotFound {
        /// Collection-relative path that failed to resolve.
        path: String,
    },

    /// I/O error from the underlying backend.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Access to a note collection and its attachments.
///
/// This is the boundary the rendering pipeline uses for all file access:
/// reading note text, resolving attachment references to concrete paths,
/// loading binary media, and writing front-matter updates back.
pub trait NoteStore: Send + Sync {
    /// Read a note's text content.
    fn read_note(&self, path: &str) -> Result<String, StoreError>;

    /// Overwrite a note's text content.
    fn write_note(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Read a file's raw bytes (used for media uploads).
    fn read_binary(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Resolve an attachment reference to a collection-relative path.
    ///
    /// The reference may be a bare filename, a full path, or a path suffix.
    /// Matching order: exact filename, exact path, then `/<name>` suffix.
    fn resolve_attachment(&self, name: &str) -> Option<String>;

    /// Resource locator for a stored file, usable as an `img src` in local
    /// preview output.
    fn resource_url(&self, path: &str) -> String;
}
