//! Shared application state for the Inkwell server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;

use inkwell_core::credentials::CredentialStore;
use inkwell_core::guard::RouteGuard;
use inkwell_core::session::SessionStore;
use inkwell_storage::DocumentStore;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Where documents live.
    pub documents: Arc<dyn DocumentStore>,
    /// Username/password validation.
    pub credentials: CredentialStore,
    /// Per-client sessions.
    pub sessions: Arc<SessionStore>,
    /// Table of routes that need a signed-in session.
    pub guard: RouteGuard,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
