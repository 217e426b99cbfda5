//! HTTP route handlers.
//!
//! - `users` — sign-in form, sign in, sign out
//! - `documents` — index, view, create, edit, update, delete

pub mod documents;
pub mod users;

use std::sync::Arc;

use axum::Router;
use axum::response::Html;

use inkwell_core::session::SessionHandle;

use crate::state::AppState;
use crate::views::{self, Page};

/// Build the application router (without middleware).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/users", users::router())
        .merge(documents::router())
}

/// Render a body inside the layout, consuming the session's flash message.
pub(crate) async fn render_page(session: &SessionHandle, body: &str) -> Html<String> {
    let flash = session.take_flash().await;
    let username = session.username().await;

    Html(views::layout(
        &Page {
            flash: flash.as_deref(),
            username: username.as_deref(),
        },
        body,
    ))
}
