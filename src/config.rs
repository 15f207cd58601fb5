use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL the server talks to (login + file API).
    pub backend_url: String,
    /// Base URL embedded in browser-visible download links.
    pub public_backend_url: String,
    /// Project identifier attached to every upload.
    pub project_id: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Secret used to sign session and OAuth-state tokens.
    pub auth_secret: String,
    /// Redirect URI registered with the OAuth provider.
    pub redirect_url: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub google_userinfo_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "File upload portal")]
pub struct Args {
    /// Host to bind to (overrides FILE_PORTAL_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_PORTAL_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Backend API base URL (overrides BACKEND_URL)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Backend base URL used in download links (overrides PUBLIC_BACKEND_URL)
    #[arg(long)]
    pub public_backend_url: Option<String>,

    /// Project identifier for uploads (overrides PROJECT_ID)
    #[arg(long)]
    pub project_id: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    ///
    /// Secrets (AUTH_SECRET, GOOGLE_CLIENT_SECRET) come from the
    /// environment only and never appear on the command line.
    pub fn from_env_and_args() -> Result<Self> {
        dotenvy::dotenv().ok();

        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILE_PORTAL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("FILE_PORTAL_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILE_PORTAL_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading FILE_PORTAL_PORT"),
        };
        let env_backend =
            env::var("BACKEND_URL").unwrap_or_else(|_| "http://127.0.0.1:4000".into());
        let env_public_backend = env::var("PUBLIC_BACKEND_URL").ok();
        let env_project = env::var("PROJECT_ID").unwrap_or_else(|_| "default".into());

        let google_client_id = env::var("GOOGLE_CLIENT_ID").unwrap_or_default();
        let google_client_secret = env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default();

        let auth_secret = match env::var("AUTH_SECRET") {
            Ok(value) if !value.is_empty() => value,
            Ok(_) => anyhow::bail!("AUTH_SECRET is set but empty"),
            Err(env::VarError::NotPresent) => {
                anyhow::bail!("AUTH_SECRET must be set (used to sign session tokens)")
            }
            Err(err) => return Err(err).context("reading AUTH_SECRET"),
        };

        // --- Merge ---
        let port = args.port.unwrap_or(env_port);
        let backend_url = trim_base(args.backend_url.unwrap_or(env_backend));
        let public_backend_url = trim_base(
            args.public_backend_url
                .or(env_public_backend)
                .unwrap_or_else(|| backend_url.clone()),
        );

        let redirect_url = env::var("AUTH_REDIRECT_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/auth/google/callback", port));

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port,
            backend_url,
            public_backend_url,
            project_id: args.project_id.unwrap_or(env_project),
            google_client_id,
            google_client_secret,
            auth_secret,
            redirect_url,
            google_auth_url: env::var("GOOGLE_AUTH_URL")
                .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".into()),
            google_token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".into()),
            google_userinfo_url: env::var("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v2/userinfo".into()),
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Base URLs are concatenated with `/api/...` paths, so a trailing
/// slash would produce `//` in every request target.
fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::trim_base;

    #[test]
    fn trim_base_strips_trailing_slashes() {
        assert_eq!(trim_base("http://x:4000/".into()), "http://x:4000");
        assert_eq!(trim_base("http://x:4000".into()), "http://x:4000");
    }
}
