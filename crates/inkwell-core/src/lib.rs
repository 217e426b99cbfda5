//! Core library for Inkwell.
//!
//! Contains the route access guard, the credential store, the session
//! manager, document-name validation, and the content renderer. This crate
//! knows nothing about the HTTP framework serving it beyond the `http`
//! crate's `Method`.

pub mod credentials;
pub mod error;
pub mod guard;
pub mod naming;
pub mod render;
pub mod session;
