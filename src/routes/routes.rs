//! Defines routes for the portal's pages, auth flow, and probes.
//!
//! ## Structure
//! - **Pages**
//!   - `GET  /` — upload page (current file list + picker)
//!   - `POST /uploads` — multipart submit, relayed to the file API
//!
//! - **Sign-in**
//!   - `GET  /login` — login form (redirects home when signed in)
//!   - `POST /login` — credentials sign-in
//!   - `GET  /auth/google` — start the Google flow
//!   - `GET  /auth/google/callback` — code exchange, sets the session cookie
//!   - `POST /logout` — drop the session cookie
//!
//! - **JSON**
//!   - `GET /api/auth/session` — the current session, or `null`
//!
//! Health probes (`/healthz`, `/readyz`) are mounted at root.

use crate::{
    handlers::{
        auth_handlers::{google_callback, google_start, login_page, login_submit, logout, session},
        health_handlers::{healthz, readyz},
        upload_handlers::{upload_page, upload_submit},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Upload submits are capped at 10 MiB; larger bodies fail multipart
/// extraction before any backend request is made.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build and return the router for the whole portal.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // pages
        .route("/", get(upload_page))
        .route("/uploads", post(upload_submit))
        // sign-in and sign-out
        .route("/login", get(login_page).post(login_submit))
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
        .route("/logout", post(logout))
        // session query interface
        .route("/api/auth/session", get(session))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
