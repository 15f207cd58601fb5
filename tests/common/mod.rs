//! Shared fixtures for the integration suites.
//!
//! Each suite drives the full router with `tower::ServiceExt::oneshot`
//! against a wiremock stand-in for the backend.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use file_portal::config::AppConfig;
use file_portal::models::user::AuthUser;
use file_portal::state::AppState;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Config aimed at a mock backend. OAuth endpoint URLs default to the
/// real provider; flow tests override them with the mock server too.
pub fn test_config(backend_url: &str) -> AppConfig {
    let backend = backend_url.trim_end_matches('/').to_string();
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        backend_url: backend.clone(),
        public_backend_url: backend,
        project_id: "proj-1".into(),
        google_client_id: "test-client".into(),
        google_client_secret: "test-client-secret".into(),
        auth_secret: TEST_SECRET.into(),
        redirect_url: "http://localhost:3000/auth/google/callback".into(),
        google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
        google_token_url: "https://oauth2.googleapis.com/token".into(),
        google_userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".into(),
    }
}

pub fn test_state(backend_url: &str) -> AppState {
    AppState::new(test_config(backend_url)).expect("build test state")
}

pub fn app(state: AppState) -> Router {
    file_portal::routes::routes::routes().with_state(state)
}

/// Sign a session cookie header value for the given identity.
pub fn session_cookie_for(
    state: &AppState,
    id: &str,
    email: &str,
    access_token: Option<&str>,
) -> String {
    let user = AuthUser {
        id: id.into(),
        email: email.into(),
        name: None,
        picture: None,
        access_token: access_token.map(str::to_string),
    };
    let token = state
        .auth
        .issue_session_token(&user)
        .expect("sign session token");
    format!("portal_session={}", token)
}

/// Send one request through the router; returns status, headers, body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
        .await
        .expect("read body");
    (
        status,
        headers,
        String::from_utf8(bytes.to_vec()).expect("utf8 body"),
    )
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("build request")
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("build request")
}

/// Build a multipart POST with text fields and `file` parts.
pub fn multipart_request(
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
    files: &[(&str, &str, Vec<u8>)],
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (filename, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("build request")
}

/// First `Set-Cookie` header that sets `name` to a non-empty value.
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let raw = value.to_str().ok()?;
            let pair = raw.split(';').next()?;
            let (key, val) = pair.split_once('=')?;
            (key == name && !val.is_empty()).then(|| val.to_string())
        })
}

/// Pull one query parameter out of a URL without decoding it.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Value of the hidden `view` field in a rendered upload page.
pub fn extract_hidden_view(html: &str) -> String {
    let marker = r#"name="view" value=""#;
    let start = html.find(marker).expect("view field present") + marker.len();
    let end = html[start..].find('"').expect("closing quote") + start;
    html[start..end].to_string()
}
