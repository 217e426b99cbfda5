//! Request middleware for Inkwell.
//!
//! Two layers run ahead of every handler:
//!
//! 1. [`session_middleware`] resolves the session cookie into a
//!    [`SessionHandle`] and stores it in the request extensions. A cookie is
//!    issued only once the handler has stored something in a new session,
//!    or after sign-in rotated the token.
//! 2. [`guard_middleware`] consults the route guard. An anonymous request
//!    to a guarded route is answered with a flash message and a redirect to
//!    `/`; the handler never runs.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{info, warn};

use inkwell_core::guard::{Access, DENIED_MESSAGE};
use inkwell_core::session::{SESSION_COOKIE, SessionHandle};

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that attaches the client's session to the request.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = session_token(req.headers());
    let session = state.sessions.open(token.as_deref()).await;
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if let Some(token) = session.pending_token().await {
        let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "failed to encode session cookie"),
        }
    }

    response
}

/// Middleware that enforces the route guard.
///
/// Must run inside [`session_middleware`].
pub async fn guard_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !state.guard.requires_auth(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return AppError::Internal("session middleware not installed".to_owned()).into_response();
    };

    match state.guard.authorize(session.username().await.as_deref()) {
        Access::Allowed => next.run(req).await,
        Access::Denied => {
            info!(
                method = %req.method(),
                path = %req.uri().path(),
                "anonymous request to guarded route"
            );
            session.set_flash(DENIED_MESSAGE).await;
            Redirect::to("/").into_response()
        }
    }
}

/// Extract the session token from the `Cookie` header(s).
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(header::COOKIE, HeaderValue::from_str(c).unwrap());
        }
        map
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let map = headers(&["theme=dark; inkwell_session=abc123; lang=en"]);
        assert_eq!(session_token(&map).as_deref(), Some("abc123"));
    }

    #[test]
    fn finds_cookie_in_second_header() {
        let map = headers(&["theme=dark", "inkwell_session=xyz"]);
        assert_eq!(session_token(&map).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        assert_eq!(session_token(&headers(&[])), None);
        assert_eq!(session_token(&headers(&["theme=dark"])), None);
        assert_eq!(session_token(&headers(&["inkwell_session="])), None);
    }
}
