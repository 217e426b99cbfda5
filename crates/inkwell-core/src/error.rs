//! Error types for `inkwell-core`.
//!
//! Credential and guard errors describe misconfiguration and are fatal to
//! the request that hits them. [`NameError`] is different: its `Display`
//! text is shown to the user verbatim.

/// Errors from loading the credential mapping.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The credential file could not be read.
    #[error("failed to read credentials from '{path}': {reason}")]
    Read { path: String, reason: String },

    /// The credential file is not a valid `username: hash` mapping.
    #[error("failed to parse credentials in '{path}': {reason}")]
    Parse { path: String, reason: String },
}

/// Errors from building the route guard.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// A rule's path pattern is not a valid regular expression.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Validation failures for a new document name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name is empty after trimming whitespace.
    #[error("A name is required.")]
    Required,

    /// A document with this name already exists.
    #[error("{name} already exists.")]
    AlreadyExists { name: String },

    /// The name cannot be stored: `.`/`..`, control characters, or too long.
    #[error("That is not a valid document name.")]
    Invalid,
}
