//! Document routes.
//!
//! Viewing is open to everyone; creating, editing, updating and deleting
//! are gated by the route guard before these handlers run. A missing
//! document is never a hard 404: the handler flashes
//! "<name> does not exist" and redirects to the index.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Router};
use serde::Deserialize;
use tracing::info;

use inkwell_core::error::NameError;
use inkwell_core::naming::validate_name;
use inkwell_core::render::{Rendered, render};
use inkwell_core::session::SessionHandle;
use inkwell_storage::{StorageError, sanitize_name};

use crate::error::AppError;
use crate::routes::render_page;
use crate::state::AppState;
use crate::views;

/// Build the document router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/new", get(new_document_form))
        .route("/create", post(create_document))
        .route("/{name}", get(view_document).post(update_document))
        .route("/{name}/edit", get(edit_document_form))
        .route("/{name}/delete", post(delete_document))
}

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateDocumentForm {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentForm {
    #[serde(default)]
    pub content: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// List all documents.
async fn index(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response, AppError> {
    let names = state.documents.list().await?;
    Ok(render_page(&session, &views::index(&names)).await.into_response())
}

async fn new_document_form(Extension(session): Extension<SessionHandle>) -> Response {
    render_page(&session, &views::new_document("")).await.into_response()
}

/// Create an empty document.
async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<CreateDocumentForm>,
) -> Result<Response, AppError> {
    let submitted = form.filename.trim();

    if submitted.is_empty() {
        return Ok(reject_name(&session, submitted, &NameError::Required).await);
    }

    // Only the final path segment is ever stored.
    let Ok(name) = sanitize_name(submitted) else {
        let err = if submitted.ends_with(['/', '\\']) {
            NameError::Required
        } else {
            NameError::Invalid
        };
        // The rejected text may hold control characters; don't echo it.
        return Ok(reject_name(&session, "", &err).await);
    };

    let existing = state.documents.list().await?;
    if let Err(err) = validate_name(&name, &existing) {
        return Ok(reject_name(&session, submitted, &err).await);
    }

    match state.documents.create(&name).await {
        Ok(()) => {
            info!(document = %name, "document created");
            session.set_flash(format!("{name} was created.")).await;
            Ok(Redirect::to("/").into_response())
        }
        // Lost a race with a concurrent create.
        Err(StorageError::AlreadyExists { name }) => {
            let err = NameError::AlreadyExists { name };
            Ok(reject_name(&session, submitted, &err).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Show a document, rendered according to its extension.
async fn view_document(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let Some(content) = read_existing(&state, &name).await? else {
        return Ok(missing(&session, &name).await);
    };

    let rendered = render(&name, &content);
    let content_type = rendered.content_type();
    let response = match rendered {
        Rendered::Html(body) => render_page(&session, &body).await.into_response(),
        Rendered::PlainText(bytes) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
    };

    Ok(response)
}

async fn edit_document_form(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let Some(content) = read_existing(&state, &name).await? else {
        return Ok(missing(&session, &name).await);
    };

    let content = String::from_utf8_lossy(&content);
    Ok(render_page(&session, &views::edit_document(&name, &content))
        .await
        .into_response())
}

/// Overwrite an existing document.
async fn update_document(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(name): Path<String>,
    Form(form): Form<UpdateDocumentForm>,
) -> Result<Response, AppError> {
    if !exists(&state, &name).await? {
        return Ok(missing(&session, &name).await);
    }

    state
        .documents
        .write(&name, form.content.as_bytes())
        .await?;

    info!(document = %name, bytes = form.content.len(), "document updated");
    session.set_flash(format!("{name} has been updated")).await;
    Ok(Redirect::to("/").into_response())
}

/// Delete a document. Deleting a missing one only flashes a message.
async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let deleted = match state.documents.delete(&name).await {
        Ok(deleted) => deleted,
        Err(StorageError::InvalidName { .. }) => false,
        Err(e) => return Err(e.into()),
    };

    if deleted {
        info!(document = %name, "document deleted");
        session.set_flash(format!("{name} was deleted.")).await;
    } else {
        session.set_flash(format!("{name} does not exist")).await;
    }

    Ok(Redirect::to("/").into_response())
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Read a document, mapping "absent" and "unusable name" to `None`.
async fn read_existing(state: &AppState, name: &str) -> Result<Option<Vec<u8>>, AppError> {
    match state.documents.read(name).await {
        Ok(content) => Ok(Some(content)),
        Err(StorageError::NotFound { .. } | StorageError::InvalidName { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn exists(state: &AppState, name: &str) -> Result<bool, AppError> {
    match state.documents.exists(name).await {
        Ok(found) => Ok(found),
        Err(StorageError::InvalidName { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn missing(session: &SessionHandle, name: &str) -> Response {
    session.set_flash(format!("{name} does not exist")).await;
    Redirect::to("/").into_response()
}

async fn reject_name(session: &SessionHandle, name: &str, err: &NameError) -> Response {
    session.set_flash(err.to_string()).await;
    let page = render_page(session, &views::new_document(name)).await;
    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response()
}
