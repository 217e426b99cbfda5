//! Application assembly: shared state and the fully layered router.
//!
//! Kept out of `main.rs` so integration tests can build the same router
//! against a temporary directory.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::{HeaderValue, header};
use axum::middleware as axum_mw;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use inkwell_core::credentials::CredentialStore;
use inkwell_core::guard::RouteGuard;
use inkwell_core::session::SessionStore;
use inkwell_storage::FsBackend;

use crate::config::ServerConfig;
use crate::middleware::{guard_middleware, session_middleware};
use crate::routes;
use crate::state::AppState;

/// Build the shared application state.
///
/// The data directory is created if missing. The credential file is parsed
/// once here so a malformed file fails startup instead of the first sign-in.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened, the credential
/// file cannot be read or parsed, or the guard rules fail to compile.
pub async fn build_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let data_dir = config.data_dir();
    let documents = FsBackend::open(&data_dir)
        .await
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;
    info!(path = %data_dir.display(), mode = ?config.mode, "using document directory");

    let credentials = CredentialStore::new(config.credentials_path());
    let users = credentials.load().await.with_context(|| {
        format!(
            "failed to load credentials from {}",
            credentials.path().display()
        )
    })?;
    info!(
        path = %credentials.path().display(),
        users = users.len(),
        "credential file loaded"
    );

    let guard = RouteGuard::standard().context("failed to compile route guard rules")?;
    let sessions = Arc::new(SessionStore::new(config.session_ttl()));

    Ok(Arc::new(AppState {
        documents: Arc::new(documents),
        credentials,
        sessions,
        guard,
    }))
}

/// Build the router with all middleware applied.
///
/// Layer order, outermost first: response headers, tracing, session, guard.
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::router()
        .layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            guard_middleware,
        ))
        .layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
