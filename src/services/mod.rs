//! Service layer: authentication and the upload relay.
//!
//! Handlers stay thin; everything that talks to the backend or the
//! OAuth provider lives here.

pub mod auth_service;
pub mod upload_service;
