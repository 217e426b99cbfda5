//! Sign-in routes: `/users/*`
//!
//! Credentials are checked against the YAML credential file. A successful
//! sign-in stores the username in the session; a failed one re-renders the
//! form with status 422.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Router};
use serde::Deserialize;
use tracing::info;

use inkwell_core::session::SessionHandle;

use crate::error::AppError;
use crate::routes::render_page;
use crate::state::AppState;
use crate::views;

/// Build the `/users` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signin", get(sign_in_form).post(sign_in))
        .route("/signout", post(sign_out))
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn sign_in_form(Extension(session): Extension<SessionHandle>) -> Response {
    render_page(&session, &views::sign_in("")).await.into_response()
}

/// Validate the submitted credentials and sign the user in.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    if state
        .credentials
        .validate(&form.username, &form.password)
        .await?
    {
        session.sign_in(&form.username).await;
        session.set_flash("Welcome!").await;
        info!(username = %form.username, "user signed in");
        return Ok(Redirect::to("/").into_response());
    }

    info!(username = %form.username, "sign-in rejected");
    session.set_flash("Invalid Credentials").await;
    let page = render_page(&session, &views::sign_in(&form.username)).await;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

async fn sign_out(Extension(session): Extension<SessionHandle>) -> Redirect {
    if let Some(username) = session.username().await {
        info!(%username, "user signed out");
    }
    session.sign_out().await;
    session.set_flash("You have been signed out.").await;
    Redirect::to("/")
}
