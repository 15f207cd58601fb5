//! Core data models for the upload portal.
//!
//! Everything here is request-scoped: identities returned by the auth
//! backend or the OAuth provider, the signed session carried in a cookie,
//! and file records the file API reports back. Nothing persists locally;
//! durable state lives in the external backend.

pub mod session;
pub mod uploaded_file;
pub mod user;
