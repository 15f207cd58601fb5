//! HTTP handlers for sign-in: the login page, the credentials form,
//! the Google redirect pair, sign-out, and the session query endpoint.

use crate::errors::AppError;
use crate::middleware::{OptionalSession, SESSION_COOKIE, STATE_COOKIE};
use crate::models::session::Session;
use crate::models::user::Credentials;
use crate::services::auth_service::{AuthError, AuthResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Form, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::debug;

/// GET `/login` — the sign-in page.
///
/// A visitor with a live session never sees the form; they are sent
/// straight home.
pub async fn login_page(OptionalSession(session): OptionalSession) -> Response {
    if session.is_some() {
        return Redirect::to("/").into_response();
    }
    super::page("Sign in", &login_form_markup(None)).into_response()
}

/// POST `/login` — credentials sign-in.
///
/// A failed attempt re-renders the form with the error inline and no
/// redirect. Success sets the session cookie and sends the browser home.
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<Response, AppError> {
    match state.auth.authorize_credentials(&credentials).await {
        Ok(user) => {
            let token = state.auth.issue_session_token(&user)?;
            let jar = jar.add(session_cookie(token));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(err) => {
            debug!("credentials sign-in failed: {}", err);
            Ok(super::page("Sign in", &login_form_markup(Some(&err.to_string()))).into_response())
        }
    }
}

/// GET `/auth/google` — begin the provider flow.
///
/// Issues the state cookie and redirects to the provider's consent page.
pub async fn google_start(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (auth_url, csrf_state, pkce_verifier) = state.auth.authorize_url();
    let token = state.auth.issue_state_token(&csrf_state, &pkce_verifier)?;
    let jar = jar.add(state_cookie(token));
    Ok((jar, Redirect::to(&auth_url)).into_response())
}

/// Query parameters the provider sends back to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET `/auth/google/callback` — finish the provider flow.
///
/// The state cookie is single-use and removed whatever happens. Every
/// failure lands back on the login form with the error inline, the same
/// boundary the credentials flow uses.
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let state_token = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(state_removal());

    match finish_google(&state, state_token, &query).await {
        Ok(token) => {
            let jar = jar.add(session_cookie(token));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(err) => {
            debug!("google sign-in failed: {}", err);
            let page = super::page("Sign in", &login_form_markup(Some(&err.to_string())));
            Ok((jar, page).into_response())
        }
    }
}

/// POST `/logout` — drop the session cookie.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(session_removal()), Redirect::to("/login"))
}

/// GET `/api/auth/session` — the session query interface.
///
/// Returns the serialized session, or JSON `null` when signed out.
/// The access token never appears here.
pub async fn session(OptionalSession(session): OptionalSession) -> Json<Option<Session>> {
    Json(session)
}

/// Walk the callback to a signed session token, in order: provider
/// error, state check, code exchange, token signing.
async fn finish_google(
    state: &AppState,
    state_token: Option<String>,
    query: &CallbackQuery,
) -> AuthResult<String> {
    if query.error.as_deref() == Some("access_denied") {
        return Err(AuthError::Denied);
    }
    if let Some(err) = &query.error {
        return Err(AuthError::Exchange(err.clone()));
    }

    let returned_state = query.state.as_deref().ok_or(AuthError::StateMismatch)?;
    let cookie_token = state_token.ok_or(AuthError::StateMismatch)?;
    let verifier = state.auth.verify_state_token(&cookie_token, returned_state)?;

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AuthError::Exchange("callback carried no authorization code".into()))?;
    let user = state.auth.exchange_google_code(code, verifier).await?;
    state.auth.issue_session_token(&user)
}

/// Render the login form, optionally with an inline error line above it.
fn login_form_markup(error: Option<&str>) -> String {
    let mut body = String::from("<h1>Sign in</h1>");
    if let Some(message) = error {
        body.push_str(&format!(
            r#"<p class="error">{}</p>"#,
            super::html_escape(message)
        ));
    }
    body.push_str(concat!(
        r#"<form method="post" action="/login">"#,
        r#"<label>Email <input type="email" name="email" required></label>"#,
        r#"<label>Password <input type="password" name="password" required></label>"#,
        r#"<button type="submit">Sign in</button>"#,
        "</form>",
        "<p>or</p>",
        r#"<form method="get" action="/auth/google">"#,
        r#"<button type="submit">Sign in with Google</button>"#,
        "</form>"
    ));
    body
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(30))
        .build()
}

fn state_cookie(token: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(10))
        .build()
}

fn session_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

fn state_removal() -> Cookie<'static> {
    Cookie::build(STATE_COOKIE).path("/").build()
}
