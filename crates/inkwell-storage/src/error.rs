//! Storage error types.
//!
//! Every error variant carries the document name or directory it concerns,
//! so a log line is enough to diagnose the failure.

/// Errors that can occur during document storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open (or create) the document directory.
    #[error("failed to open document store at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a document.
    #[error("failed to read document '{name}': {reason}")]
    Read { name: String, reason: String },

    /// Failed to write a document.
    #[error("failed to write document '{name}': {reason}")]
    Write { name: String, reason: String },

    /// Failed to delete a document.
    #[error("failed to delete document '{name}': {reason}")]
    Delete { name: String, reason: String },

    /// Failed to enumerate the document directory.
    #[error("failed to list documents in '{path}': {reason}")]
    List { path: String, reason: String },

    /// The requested document does not exist.
    #[error("document '{name}' does not exist")]
    NotFound { name: String },

    /// A document with this name already exists.
    #[error("document '{name}' already exists")]
    AlreadyExists { name: String },

    /// The supplied name cannot be used as a document name.
    #[error("invalid document name: {reason}")]
    InvalidName { reason: String },
}
