//! Flat-file storage backend, the production default.
//!
//! Each document is one regular file directly inside the store directory;
//! the filename is the document name and the file body is its content.
//! Subdirectories, symlinks and other non-file entries are ignored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::{DocumentStore, StorageError, sanitize_name};

/// A document store backed by a directory on disk.
///
/// # Examples
///
/// ```no_run
/// # use inkwell_storage::FsBackend;
/// # #[tokio::main]
/// # async fn main() {
/// let backend = FsBackend::open("./data").await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Open the document directory at the given path.
    ///
    /// Creates the directory (and its parents) if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the directory cannot be created or
    /// the path exists but is not a directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let open_err = |reason: String| StorageError::Open {
            path: path.display().to_string(),
            reason,
        };

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| open_err(e.to_string()))?;

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| open_err(e.to_string()))?;
        if !meta.is_dir() {
            return Err(open_err("not a directory".to_owned()));
        }

        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Return the directory this backend stores documents in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, name: &str) -> Result<(String, PathBuf), StorageError> {
        let name = sanitize_name(name)?;
        let path = self.root.join(&name);
        Ok((name, path))
    }

    /// Whether `path` is a regular file. Symlinks are not followed, so a
    /// link pointing out of the store never counts as a document.
    async fn is_file(path: &Path) -> bool {
        tokio::fs::symlink_metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl DocumentStore for FsBackend {
    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let list_err = |e: std::io::Error| StorageError::List {
            path: self.root.display().to_string(),
            reason: e.to_string(),
        };

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(list_err)?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            if !Self::is_file(&entry.path()).await {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!(name = ?raw, "skipping document with non-UTF-8 name"),
            }
        }

        names.sort();
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let (name, path) = self.document_path(name)?;

        if !Self::is_file(&path).await {
            return Err(StorageError::NotFound { name });
        }

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound { name: name.clone() },
            _ => StorageError::Read {
                name: name.clone(),
                reason: e.to_string(),
            },
        })
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let (name, path) = self.document_path(name)?;

        // Writing through a symlink or into a directory would leave the store.
        match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) if !meta.is_file() => {
                return Err(StorageError::Write {
                    name,
                    reason: "not a regular file".to_owned(),
                });
            }
            _ => {}
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| StorageError::Write {
                name,
                reason: e.to_string(),
            })
    }

    async fn create(&self, name: &str) -> Result<(), StorageError> {
        let (name, path) = self.document_path(name)?;

        // `create_new` fails atomically if the file is already there.
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map(drop)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists { name: name.clone() },
                _ => StorageError::Write {
                    name: name.clone(),
                    reason: e.to_string(),
                },
            })
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let (name, path) = self.document_path(name)?;

        if !Self::is_file(&path).await {
            return Ok(false);
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Delete {
                name,
                reason: e.to_string(),
            }),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let (_, path) = self.document_path(name)?;
        Ok(Self::is_file(&path).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn make_backend() -> (tempfile::TempDir, FsBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::open(dir.path().join("data")).await.unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/data");
        let backend = FsBackend::open(&target).await.unwrap();
        assert!(target.is_dir());
        assert_eq!(backend.path(), target.as_path());
    }

    #[tokio::test]
    async fn open_rejects_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let result = FsBackend::open(&file).await;
        assert!(matches!(result, Err(StorageError::Open { .. })));
    }

    #[tokio::test]
    async fn list_is_sorted_and_skips_directories() {
        let (_dir, backend) = make_backend().await;
        backend.write("history.txt", b"1995").await.unwrap();
        backend.write("about.md", b"# Ruby").await.unwrap();
        backend.write("changes.txt", b"2.6").await.unwrap();
        std::fs::create_dir(backend.path().join("drafts")).unwrap();

        let names = backend.list().await.unwrap();
        assert_eq!(names, vec!["about.md", "changes.txt", "history.txt"]);
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let (_dir, backend) = make_backend().await;
        let result = backend.read("nope.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound { name }) if name == "nope.txt"));
    }

    #[tokio::test]
    async fn write_overwrites_content() {
        let (_dir, backend) = make_backend().await;
        backend.write("changes.txt", b"old").await.unwrap();
        backend.write("changes.txt", b"new content").await.unwrap();
        assert_eq!(backend.read("changes.txt").await.unwrap(), b"new content");
    }

    #[tokio::test]
    async fn create_makes_empty_document_once() {
        let (_dir, backend) = make_backend().await;
        backend.create("story.md").await.unwrap();
        assert_eq!(backend.read("story.md").await.unwrap(), b"");

        let again = backend.create("story.md").await;
        assert!(matches!(again, Err(StorageError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn create_empty_name_is_invalid() {
        let (_dir, backend) = make_backend().await;
        let result = backend.create("").await;
        assert!(matches!(result, Err(StorageError::InvalidName { .. })));
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let (_dir, backend) = make_backend().await;
        backend.write("changes.txt", b"x").await.unwrap();

        assert!(backend.delete("changes.txt").await.unwrap());
        assert!(!backend.delete("changes.txt").await.unwrap());
        assert!(!backend.exists("changes.txt").await.unwrap());
    }

    #[tokio::test]
    async fn traversal_stays_inside_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("users.yml"), b"admin: hash").unwrap();
        let backend = FsBackend::open(dir.path().join("data")).await.unwrap();

        assert!(!backend.exists("../users.yml").await.unwrap());

        backend.write("../escape.txt", b"contained").await.unwrap();
        assert!(!dir.path().join("escape.txt").exists());
        assert!(backend.path().join("escape.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_out_of_the_store_are_not_documents() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("users.yml");
        std::fs::write(&outside, b"admin: hash").unwrap();
        let backend = FsBackend::open(dir.path().join("data")).await.unwrap();
        std::os::unix::fs::symlink(&outside, backend.path().join("leak.txt")).unwrap();

        assert!(backend.list().await.unwrap().is_empty());
        assert!(!backend.exists("leak.txt").await.unwrap());
        assert!(matches!(
            backend.read("leak.txt").await,
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(
            backend.write("leak.txt", b"overwritten").await,
            Err(StorageError::Write { .. })
        ));
        assert_eq!(std::fs::read(&outside).unwrap(), b"admin: hash");
    }
}
