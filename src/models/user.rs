//! Identities as the auth backend and the OAuth provider report them.

use serde::{Deserialize, Serialize};

/// Email/password pair submitted through the login form.
///
/// Serialized as-is into the JSON body of the backend login request.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// An authenticated user, as returned by the backend login endpoint or
/// assembled from the provider's userinfo response.
///
/// Only `id` and `email` are carried into the session; `name` and
/// `picture` are accepted but unused downstream.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthUser {
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,

    /// Bearer token for the file API. The backend login response may
    /// include it as `accessToken` (or `token`); the OAuth path fills
    /// it with the provider access token.
    #[serde(default, rename = "accessToken", alias = "token")]
    pub access_token: Option<String>,
}
