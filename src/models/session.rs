//! Signed session state carried in the session cookie.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims signed into a session token.
///
/// Exactly the identity fields cross into the token: `sub` (user id)
/// and `email`, plus the backend access token when the login produced
/// one. Nothing else from the login response is carried.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SessionClaims {
    /// Subject: the user id.
    pub sub: String,

    pub email: String,

    /// Bearer token for the file API, absent when the login issued none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Issued-at, seconds since epoch.
    pub iat: i64,

    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// The identity slice of a session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

/// A verified session, materialized from a valid token.
///
/// Serializes as `{"user": {...}, "expires": ...}`. The access token
/// never serializes; handlers read it in-process only.
#[derive(Serialize, Clone, Debug)]
pub struct Session {
    pub user: SessionUser,

    /// When the session token expires.
    pub expires: DateTime<Utc>,

    #[serde(skip)]
    pub access_token: Option<String>,
}
