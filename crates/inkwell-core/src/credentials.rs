//! Credential store for Inkwell.
//!
//! Credentials are a YAML mapping of `username: bcrypt-hash`, one user per
//! line. The file is read fresh on every validation so edits take effect
//! without a restart; the application never writes it.
//!
//! # Security model
//!
//! - Only bcrypt hashes are stored; plaintext passwords never touch disk.
//! - Comparison is done by `bcrypt::verify`, which re-derives the hash with
//!   the stored salt and cost and compares in constant time.
//! - An unknown username and a wrong password are indistinguishable to the
//!   caller (`Ok(false)` in both cases).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CredentialError;

/// Loads and checks username/password pairs against the credential file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store reading from the given YAML file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full `username -> hash` mapping.
    ///
    /// An empty file yields an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Read`] if the file cannot be read and
    /// [`CredentialError::Parse`] if it is not a string-to-string mapping.
    pub async fn load(&self) -> Result<HashMap<String, String>, CredentialError> {
        let path_str = || self.path.display().to_string();

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CredentialError::Read {
                path: path_str(),
                reason: e.to_string(),
            })?;

        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_yaml::from_str(&raw).map_err(|e| CredentialError::Parse {
            path: path_str(),
            reason: e.to_string(),
        })
    }

    /// Check a username/password pair.
    ///
    /// Returns `Ok(false)` for an unknown user, a wrong password, or a stored
    /// hash that bcrypt cannot parse (the latter is logged).
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] only if the credential file itself
    /// cannot be loaded.
    pub async fn validate(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let users = self.load().await?;

        let Some(hash) = users.get(username) else {
            debug!(username, "sign-in attempt for unknown user");
            return Ok(false);
        };

        match bcrypt::verify(password, hash) {
            Ok(matched) => Ok(matched),
            Err(e) => {
                warn!(username, error = %e, "stored password hash is malformed");
                Ok(false)
            }
        }
    }
}
