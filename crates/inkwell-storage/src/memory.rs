//! In-memory document store for testing.
//!
//! Documents live in a `BTreeMap` behind a `RwLock`, so listing is already
//! sorted. Nothing is persisted.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{DocumentStore, StorageError, sanitize_name};

/// An in-memory document store backed by a `BTreeMap`.
///
/// Cloned handles share the same documents.
///
/// # Examples
///
/// ```
/// # use inkwell_storage::{DocumentStore, MemoryBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryBackend::new();
/// store.write("notes.txt", b"hello").await.unwrap();
/// assert_eq!(store.read("notes.txt").await.unwrap(), b"hello");
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    docs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryBackend {
    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let docs = self.docs.read().await;
        Ok(docs.keys().cloned().collect())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let name = sanitize_name(name)?;
        let docs = self.docs.read().await;
        docs.get(&name)
            .cloned()
            .ok_or(StorageError::NotFound { name })
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StorageError> {
        let name = sanitize_name(name)?;
        let mut docs = self.docs.write().await;
        docs.insert(name, content.to_vec());
        Ok(())
    }

    async fn create(&self, name: &str) -> Result<(), StorageError> {
        let name = sanitize_name(name)?;
        let mut docs = self.docs.write().await;
        match docs.entry(name) {
            Entry::Occupied(e) => Err(StorageError::AlreadyExists {
                name: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(Vec::new());
                Ok(())
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let name = sanitize_name(name)?;
        let mut docs = self.docs.write().await;
        Ok(docs.remove(&name).is_some())
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let name = sanitize_name(name)?;
        let docs = self.docs.read().await;
        Ok(docs.contains_key(&name))
    }
}
