//! Shared application state handed to every handler.

use crate::config::AppConfig;
use crate::services::auth_service::AuthService;
use crate::services::upload_service::UploadService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthService,
    pub uploads: UploadService,
}

impl AppState {
    /// Build both services from one configuration.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let auth = AuthService::new(&config)?;
        let uploads = UploadService::new(
            config.backend_url.clone(),
            config.public_backend_url.clone(),
        );
        Ok(Self {
            config,
            auth,
            uploads,
        })
    }
}
