//! src/middleware.rs
//!
//! Session extraction. `OptionalSession` never rejects a request;
//! handlers decide what an absent session means for their route.

use crate::models::session::Session;
use crate::state::AppState;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use std::convert::Infallible;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "portal_session";

/// Short-lived cookie carrying the signed OAuth state across the
/// provider round-trip.
pub const STATE_COOKIE: &str = "portal_oauth";

/// The verified session, when the request carries a valid session cookie.
///
/// Absent, expired, and tampered cookies all read as `None`; page
/// handlers render the signed-out variant instead of failing.
pub struct OptionalSession(pub Option<Session>);

impl<S> FromRequestParts<S> for OptionalSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let session = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| app_state.auth.session_from_token(cookie.value()).ok());
        Ok(Self(session))
    }
}
