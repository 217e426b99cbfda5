//! HTTP error types for the Inkwell server.
//!
//! User mistakes (bad names, missing documents, anonymous access) never
//! reach this type: handlers answer those with a flash message and a
//! redirect or a re-rendered form. `AppError` covers what is left, mostly
//! storage or credential failures, and renders it as a small HTML page.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use inkwell_core::error::CredentialError;
use inkwell_storage::StorageError;

use crate::views;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Requested resource not found.
    NotFound(String),
    /// Client sent invalid input.
    BadRequest(String),
    /// Storage, credential file, or other server-side failure.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                // Details stay in the log.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };

        let page = views::layout(&views::Page::default(), &views::error(&message));
        (status, Html(page)).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => Self::NotFound(err.to_string()),
            StorageError::InvalidName { .. } | StorageError::AlreadyExists { .. } => {
                Self::BadRequest(err.to_string())
            }
            StorageError::Open { .. }
            | StorageError::Read { .. }
            | StorageError::Write { .. }
            | StorageError::Delete { .. }
            | StorageError::List { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_to_status() {
        let cases = [
            (
                StorageError::NotFound {
                    name: "a.txt".to_owned(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                StorageError::InvalidName {
                    reason: "empty".to_owned(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Write {
                    name: "a.txt".to_owned(),
                    reason: "disk full".to_owned(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn credential_errors_are_internal() {
        let err = CredentialError::Read {
            path: "users.yml".to_owned(),
            reason: "permission denied".to_owned(),
        };
        assert_eq!(
            AppError::from(err).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
