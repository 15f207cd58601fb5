//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks OAuth config and backend reachability

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Very small liveness probe: always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap and never perform I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Reports whether the Google client id and secret are configured.
/// 2. Probes the backend with a short HEAD request; any HTTP response
///    counts as reachable.
///
/// Returns JSON describing each check. Only the backend check gates
/// readiness: the portal can still serve credentials sign-ins when no
/// Google client is configured, so HTTP 503 means the backend is down.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    // 1) OAuth configuration check (reported, never fatal)
    let oauth_check = if !state.config.google_client_id.is_empty()
        && !state.config.google_client_secret.is_empty()
    {
        (true, None::<String>)
    } else {
        (
            false,
            Some("google client id or secret not configured".to_string()),
        )
    };

    // 2) Backend reachability check
    let backend_check = match state.uploads.probe_backend().await {
        Ok(()) => (true, None::<String>),
        Err(err) => (false, Some(err)),
    };

    let ready = backend_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "oauth",
        CheckStatus {
            ok: oauth_check.0,
            error: oauth_check.1,
        },
    );
    checks.insert(
        "backend",
        CheckStatus {
            ok: backend_check.0,
            error: backend_check.1,
        },
    );

    let body = ReadyResponse {
        status: if ready { "ok".into() } else { "error".into() },
        checks,
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
