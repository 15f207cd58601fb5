//! src/services/auth_service.rs
//!
//! AuthService: credentials sign-in against the backend, the Google
//! authorization-code flow (with PKCE), and the signed tokens that carry
//! a session between requests. The service holds no per-user state; a
//! session exists only as the cookie it signs.

use crate::config::AppConfig;
use crate::models::session::{Session, SessionClaims, SessionUser};
use crate::models::user::{AuthUser, Credentials};
use anyhow::Context;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend or provider looked at the credentials and said no.
    #[error("authentication denied")]
    Denied,
    #[error("auth backend unreachable: {0}")]
    Network(String),
    #[error("login request rejected by the backend ({0})")]
    UpstreamRequest(StatusCode),
    #[error("auth backend error ({0})")]
    UpstreamFailure(StatusCode),
    #[error("unreadable auth backend response: {0}")]
    MalformedResponse(String),
    #[error("code exchange with the provider failed: {0}")]
    Exchange(String),
    #[error("sign-in state mismatch, restart the sign-in")]
    StateMismatch,
    #[error("session token rejected")]
    InvalidToken,
    #[error("token signing failed: {0}")]
    Signing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Claims for the short-lived token riding the state cookie between the
/// redirect to the provider and the callback.
#[derive(Serialize, Deserialize)]
struct StateClaims {
    /// CSRF state the provider must echo back.
    state: String,
    /// PKCE verifier matching the challenge sent with the redirect.
    pkce: String,
    iat: i64,
    exp: i64,
}

/// AuthService performs every authentication step the portal needs:
/// - credentials login (POST to the backend login endpoint)
/// - the Google authorization-code flow, code exchange and userinfo fetch
/// - signing and verifying session tokens and OAuth-state tokens
///
/// Handlers never see provider or backend responses directly; they get an
/// `AuthUser` or an `AuthError` kind they can render.
#[derive(Clone)]
pub struct AuthService {
    /// Shared HTTP client for backend and provider calls.
    http: reqwest::Client,

    base_url: String,

    userinfo_url: String,

    oauth: ConfiguredClient,

    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// Session lifetime: 30 days.
const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;
/// A sign-in attempt must complete the provider round-trip within 10 minutes.
const STATE_TTL_SECS: i64 = 10 * 60;

impl AuthService {
    /// Build the service from configuration.
    ///
    /// Fails only when a configured URL does not parse. Empty Google
    /// credentials are accepted here and refused by the provider instead,
    /// matching the permissive env defaults.
    pub fn new(cfg: &AppConfig) -> anyhow::Result<Self> {
        let oauth = BasicClient::new(ClientId::new(cfg.google_client_id.clone()))
            .set_client_secret(ClientSecret::new(cfg.google_client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(cfg.google_auth_url.clone()).context("parsing GOOGLE_AUTH_URL")?,
            )
            .set_token_uri(
                TokenUrl::new(cfg.google_token_url.clone()).context("parsing GOOGLE_TOKEN_URL")?,
            )
            .set_redirect_uri(
                RedirectUrl::new(cfg.redirect_url.clone()).context("parsing AUTH_REDIRECT_URL")?,
            );

        // The code exchange requires a client that does not follow redirects.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            base_url: cfg.backend_url.clone(),
            userinfo_url: cfg.google_userinfo_url.clone(),
            oauth,
            encoding_key: EncodingKey::from_secret(cfg.auth_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(cfg.auth_secret.as_bytes()),
        })
    }

    /// Split a non-success status into the matching error kind.
    fn status_error(status: StatusCode) -> AuthError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            AuthError::Denied
        } else if status.is_client_error() {
            AuthError::UpstreamRequest(status)
        } else if status.is_server_error() {
            AuthError::UpstreamFailure(status)
        } else {
            AuthError::MalformedResponse(format!("unexpected status {}", status))
        }
    }

    /// POST the credentials to the backend login endpoint.
    ///
    /// Failure causes stay distinguishable instead of collapsing into one
    /// generic denial:
    /// - 401/403, or a 2xx body without a user: `Denied`
    /// - other 4xx: `UpstreamRequest`; 5xx: `UpstreamFailure`
    /// - transport errors: `Network`; undecodable 2xx body: `MalformedResponse`
    pub async fn authorize_credentials(&self, credentials: &Credentials) -> AuthResult<AuthUser> {
        let url = format!("{}/api/auth/login", self.base_url);
        debug!("credentials login for {} via {}", credentials.email, url);

        let response = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("login refused with status {}", status);
            return Err(Self::status_error(status));
        }

        // A 2xx carrying JSON `null` (or nothing) is how the backend
        // reports unknown users without an error status.
        let body = response
            .text()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(AuthError::Denied);
        }

        serde_json::from_str(trimmed).map_err(|err| AuthError::MalformedResponse(err.to_string()))
    }

    /// Build the provider authorization URL for a new sign-in attempt.
    ///
    /// Returns the URL to redirect to, the CSRF state the provider must
    /// echo back, and the PKCE verifier the callback presents again.
    pub fn authorize_url(&self) -> (String, String, String) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .oauth
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        (
            auth_url.to_string(),
            csrf_state.secret().clone(),
            pkce_verifier.secret().clone(),
        )
    }

    /// Exchange an authorization code for tokens, then fetch the signed-in
    /// user's profile from the userinfo endpoint.
    ///
    /// The provider access token is carried into the returned `AuthUser`
    /// so uploads can present it to the file API.
    pub async fn exchange_google_code(
        &self,
        code: &str,
        pkce_verifier: String,
    ) -> AuthResult<AuthUser> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|err| AuthError::Exchange(err.to_string()))?;

        let access_token = token.access_token().secret().clone();
        debug!("code exchange complete, fetching userinfo");

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status));
        }

        let mut user: AuthUser = response
            .json()
            .await
            .map_err(|err| AuthError::MalformedResponse(err.to_string()))?;
        user.access_token = Some(access_token);
        Ok(user)
    }

    /// Sign a session token for an authenticated user.
    ///
    /// Exactly `id` and `email` cross from the login response into the
    /// claims, plus the access token when one was issued.
    pub fn issue_session_token(&self, user: &AuthUser) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            access_token: user.access_token.clone(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Verify a session token and materialize the session it names.
    ///
    /// Bad signature, expiry, and structural problems all map to
    /// `InvalidToken`; the bearer is signed out either way.
    pub fn session_from_token(&self, token: &str) -> AuthResult<Session> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        let expires =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(Session {
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
            },
            expires,
            access_token: claims.access_token,
        })
    }

    /// Sign the short-lived token carrying the CSRF state and PKCE
    /// verifier across the provider round-trip.
    pub fn issue_state_token(&self, state: &str, pkce_verifier: &str) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let claims = StateClaims {
            state: state.to_string(),
            pkce: pkce_verifier.to_string(),
            iat: now,
            exp: now + STATE_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Check the state echoed by the provider against the state cookie
    /// and recover the PKCE verifier.
    ///
    /// An expired or tampered cookie and a mismatched `state` parameter
    /// all abort the sign-in with `StateMismatch`.
    pub fn verify_state_token(&self, token: &str, returned_state: &str) -> AuthResult<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = jsonwebtoken::decode::<StateClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::StateMismatch)?;

        if data.claims.state != returned_state {
            return Err(AuthError::StateMismatch);
        }
        Ok(data.claims.pkce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret: &str) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            backend_url: "http://127.0.0.1:4000".into(),
            public_backend_url: "http://127.0.0.1:4000".into(),
            project_id: "default".into(),
            google_client_id: "cid".into(),
            google_client_secret: "csecret".into(),
            auth_secret: secret.into(),
            redirect_url: "http://localhost:3000/auth/google/callback".into(),
            google_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            google_token_url: "https://oauth2.googleapis.com/token".into(),
            google_userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".into(),
        }
    }

    fn service() -> AuthService {
        AuthService::new(&test_config("test-secret")).unwrap()
    }

    fn user() -> AuthUser {
        AuthUser {
            id: "u1".into(),
            email: "u1@example.com".into(),
            name: Some("U One".into()),
            picture: None,
            access_token: Some("backend-token".into()),
        }
    }

    #[test]
    fn session_token_round_trip_preserves_identity() {
        let svc = service();
        let token = svc.issue_session_token(&user()).unwrap();
        let session = svc.session_from_token(&token).unwrap();

        assert_eq!(session.user.id, "u1");
        assert_eq!(session.user.email, "u1@example.com");
        assert_eq!(session.access_token.as_deref(), Some("backend-token"));
        assert!(session.expires > Utc::now());
    }

    #[test]
    fn token_without_access_token_yields_none() {
        let svc = service();
        let mut u = user();
        u.access_token = None;
        let token = svc.issue_session_token(&u).unwrap();
        let session = svc.session_from_token(&token).unwrap();
        assert!(session.access_token.is_none());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let svc = service();
        let other = AuthService::new(&test_config("other-secret")).unwrap();
        let token = other.issue_session_token(&user()).unwrap();
        assert!(matches!(
            svc.session_from_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_session_token_is_rejected() {
        let svc = service();
        // Expired beyond the default 60s validation leeway.
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "u1".into(),
            email: "u1@example.com".into(),
            access_token: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(
            svc.session_from_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn state_token_is_not_a_session_token() {
        let svc = service();
        let token = svc.issue_state_token("st", "verifier").unwrap();
        assert!(matches!(
            svc.session_from_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn state_round_trip_recovers_verifier() {
        let svc = service();
        let token = svc.issue_state_token("st-123", "verifier-abc").unwrap();
        assert_eq!(svc.verify_state_token(&token, "st-123").unwrap(), "verifier-abc");
    }

    #[test]
    fn mismatched_state_is_rejected() {
        let svc = service();
        let token = svc.issue_state_token("st-123", "verifier-abc").unwrap();
        assert!(matches!(
            svc.verify_state_token(&token, "st-456"),
            Err(AuthError::StateMismatch)
        ));
    }

    #[test]
    fn authorize_url_carries_scopes_state_and_pkce() {
        let svc = service();
        let (url, state, verifier) = svc.authorize_url();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("scope=openid+profile+email"));
        assert!(url.contains(&format!("state={}", state)));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(!verifier.is_empty());
    }

    #[test]
    fn status_error_kinds() {
        assert!(matches!(
            AuthService::status_error(StatusCode::UNAUTHORIZED),
            AuthError::Denied
        ));
        assert!(matches!(
            AuthService::status_error(StatusCode::FORBIDDEN),
            AuthError::Denied
        ));
        assert!(matches!(
            AuthService::status_error(StatusCode::UNPROCESSABLE_ENTITY),
            AuthError::UpstreamRequest(_)
        ));
        assert!(matches!(
            AuthService::status_error(StatusCode::BAD_GATEWAY),
            AuthError::UpstreamFailure(_)
        ));
    }
}
