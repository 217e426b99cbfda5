//! Inkwell HTTP server.
//!
//! Wires the document store, credential store, session manager and route
//! guard into an Axum router serving the HTML pages of the application.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod views;
