//! File upload portal.
//!
//! A small server-rendered front for an external backend: users sign in
//! with Google or with credentials the backend verifies, the resulting
//! identity rides in a signed session cookie, and uploads are relayed to
//! the backend file API with the session's bearer token.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
