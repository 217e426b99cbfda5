//! Document storage abstraction for Inkwell.
//!
//! This crate defines the [`DocumentStore`] trait, a narrow interface over
//! a flat namespace of named documents. It knows nothing about HTTP,
//! sessions, or how documents are rendered.
//!
//! Two implementations are provided:
//!
//! - [`FsBackend`] — production default, one file per document in a directory
//! - [`MemoryBackend`] — in-memory, for testing only

mod error;
mod fs_backend;
mod memory;

pub use error::StorageError;
pub use fs_backend::FsBackend;
pub use memory::MemoryBackend;

/// A pluggable document store keyed by filename.
///
/// Names passed to any method are user input. Implementations must run them
/// through [`sanitize_name`] before touching their keyspace, so that a name
/// like `../users.yml` resolves to `users.yml` inside the store.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// List every document name, sorted lexicographically.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying backend fails.
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Read the full content of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the document does not exist and
    /// [`StorageError::Read`] if the backend fails.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Store a document, overwriting any existing content.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StorageError>;

    /// Create a new, empty document.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidName`] for an empty name,
    /// [`StorageError::AlreadyExists`] if the name is taken, and
    /// [`StorageError::Write`] if the backend fails.
    async fn create(&self, name: &str) -> Result<(), StorageError>;

    /// Delete a document. Deleting a missing document is not an error.
    ///
    /// Returns `true` if a document was removed, `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Check whether a document exists.
    ///
    /// The default implementation calls [`read`](DocumentStore::read).
    /// Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        match self.read(name).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Longest document name accepted, in bytes. Matches the common
/// filesystem limit for a single path component.
pub const MAX_NAME_LEN: usize = 255;

/// Reduce a user-supplied name to its final path component.
///
/// Both `/` and `\` count as separators. The result is never empty, never
/// `.` or `..`, holds no control characters and is at most
/// [`MAX_NAME_LEN`] bytes long.
///
/// # Errors
///
/// Returns [`StorageError::InvalidName`] if nothing usable is left.
pub fn sanitize_name(raw: &str) -> Result<String, StorageError> {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();

    let reason = match base {
        "" => "name is empty".to_owned(),
        "." | ".." => format!("'{base}' is not a document name"),
        _ if base.chars().any(char::is_control) => "name contains control characters".to_owned(),
        _ if base.len() > MAX_NAME_LEN => format!("name is longer than {MAX_NAME_LEN} bytes"),
        _ => return Ok(base.to_owned()),
    };

    Err(StorageError::InvalidName { reason })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_is_kept() {
        assert_eq!(sanitize_name("about.md").unwrap(), "about.md");
    }

    #[test]
    fn directory_components_are_stripped() {
        assert_eq!(sanitize_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_name("/abs/path/notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_name("..\\users.yml").unwrap(), "users.yml");
    }

    #[test]
    fn empty_and_dot_names_are_rejected() {
        assert!(matches!(
            sanitize_name(""),
            Err(StorageError::InvalidName { .. })
        ));
        assert!(matches!(
            sanitize_name("dir/"),
            Err(StorageError::InvalidName { .. })
        ));
        assert!(matches!(
            sanitize_name(".."),
            Err(StorageError::InvalidName { .. })
        ));
        assert!(matches!(
            sanitize_name("a/."),
            Err(StorageError::InvalidName { .. })
        ));
    }

    #[test]
    fn control_characters_are_rejected() {
        for raw in ["a\0b.txt", "line\nbreak.md", "tab\there.txt", "bell\u{7}.txt"] {
            assert!(
                matches!(sanitize_name(raw), Err(StorageError::InvalidName { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn overlong_names_are_rejected() {
        let longest = format!("{}.txt", "a".repeat(MAX_NAME_LEN - 4));
        assert_eq!(sanitize_name(&longest).unwrap(), longest);

        let too_long = format!("{}.txt", "a".repeat(MAX_NAME_LEN - 3));
        assert!(matches!(
            sanitize_name(&too_long),
            Err(StorageError::InvalidName { .. })
        ));

        // Multi-byte characters count by encoded length.
        let wide = "é".repeat(MAX_NAME_LEN / 2 + 1);
        assert!(matches!(
            sanitize_name(&wide),
            Err(StorageError::InvalidName { .. })
        ));
    }
}
