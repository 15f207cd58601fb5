//! src/services/upload_service.rs
//!
//! UploadService: relays files to the backend file API with a bearer
//! token and keeps the per-page-view upload list. The portal stores no
//! file bytes itself; a view's list is in-memory bookkeeping for what
//! the backend accepted during that page visit.

use crate::models::uploaded_file::UploadedFile;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file API unreachable: {0}")]
    Network(String),
    #[error("upload rejected by the file API ({0})")]
    Rejected(StatusCode),
    #[error("file API error ({0})")]
    Backend(StatusCode),
    #[error("unreadable file API response: {0}")]
    MalformedResponse(String),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Upload results accumulated for one render of the upload page.
///
/// The list is append-only for the lifetime of the view; a failure sets
/// `error` and leaves the list untouched.
struct ViewState {
    files: Vec<UploadedFile>,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl ViewState {
    fn new() -> Self {
        Self {
            files: Vec::new(),
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// Snapshot of a view's upload list, cloned out for rendering.
#[derive(Debug, Default, Clone)]
pub struct ViewSnapshot {
    pub files: Vec<UploadedFile>,
    pub error: Option<String>,
}

/// UploadService provides the portal's file plumbing:
/// - relay an upload to the backend (multipart `file` + `projectId`,
///   bearer-authenticated)
/// - track per-view upload lists and the last error per view
/// - build browser-facing download URLs
///
/// Concurrent uploads against one view run their backend requests in
/// parallel; list appends serialize behind the registry lock in
/// completion order.
#[derive(Clone)]
pub struct UploadService {
    /// HTTP client for file API calls.
    http: reqwest::Client,

    base_url: String,

    /// Base for download links handed to the browser.
    public_base_url: String,

    /// Live page views, keyed by the id the page carries in its form.
    views: Arc<Mutex<HashMap<Uuid, ViewState>>>,
}

/// Views are dropped an hour after the page render that created them.
const VIEW_TTL_SECS: i64 = 60 * 60;

impl UploadService {
    pub fn new(backend_url: impl Into<String>, public_backend_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: backend_url.into(),
            public_base_url: public_backend_url.into(),
            views: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A poisoned lock only means a panic mid-update; the map stays usable.
    fn lock_views(&self) -> MutexGuard<'_, HashMap<Uuid, ViewState>> {
        self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a fresh view for a page render and prune expired ones.
    pub fn create_view(&self) -> Uuid {
        let mut views = self.lock_views();
        prune_expired(&mut views, Utc::now());
        let id = Uuid::new_v4();
        views.insert(id, ViewState::new());
        id
    }

    /// Clone out a view's current list and error for rendering.
    ///
    /// An unknown or expired view reads as empty rather than failing;
    /// the page simply shows no uploads.
    pub fn snapshot(&self, view: Uuid) -> ViewSnapshot {
        let views = self.lock_views();
        match views.get(&view) {
            Some(state) => ViewSnapshot {
                files: state.files.clone(),
                error: state.error.clone(),
            },
            None => ViewSnapshot::default(),
        }
    }

    /// Append an accepted upload to its view and clear the error line.
    ///
    /// Recreates the view when it expired between render and submit, so
    /// a slow but successful upload is not dropped.
    pub fn record_success(&self, view: Uuid, file: UploadedFile) {
        let mut views = self.lock_views();
        let state = views.entry(view).or_insert_with(ViewState::new);
        state.files.push(file);
        state.error = None;
    }

    /// Set a view's error line, leaving its list untouched.
    pub fn record_failure(&self, view: Uuid, message: String) {
        let mut views = self.lock_views();
        let state = views.entry(view).or_insert_with(ViewState::new);
        state.error = Some(message);
    }

    /// Relay one file to the backend file API.
    ///
    /// Sends multipart fields `file` (original filename and MIME type
    /// preserved) and `projectId`, authorized with the session's bearer
    /// token. Statuses split into `Rejected` (4xx) and `Backend` (5xx);
    /// a 2xx that does not decode into a file record is
    /// `MalformedResponse`.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Bytes,
        project_id: &str,
        access_token: &str,
    ) -> UploadResult<UploadedFile> {
        let url = format!("{}/api/files", self.base_url);
        debug!("relaying {} ({} bytes) to {}", file_name, bytes.len(), url);

        let form = Form::new()
            .part("file", file_part(file_name, content_type, &bytes))
            .text("projectId", project_id.to_string());

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(UploadError::Rejected(status));
        }
        if status.is_server_error() {
            return Err(UploadError::Backend(status));
        }
        if !status.is_success() {
            return Err(UploadError::MalformedResponse(format!(
                "unexpected status {}",
                status
            )));
        }

        response
            .json::<UploadedFile>()
            .await
            .map_err(|err| UploadError::MalformedResponse(err.to_string()))
    }

    /// Browser-facing download URL for an uploaded file.
    pub fn download_url(&self, file: &UploadedFile) -> String {
        format!("{}/api/files/{}", self.public_base_url, file.id)
    }

    /// Readiness probe against the backend.
    ///
    /// Any HTTP response counts as reachable, error statuses included;
    /// only transport failures and the 2 second timeout report down.
    pub async fn probe_backend(&self) -> Result<(), String> {
        let url = format!("{}/", self.base_url);
        match self
            .http
            .head(&url)
            .timeout(std::time::Duration::from_secs(2))
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// Build the `file` part, keeping the submitted filename and MIME type.
/// An unparseable type falls back to reqwest's default part type.
fn file_part(file_name: &str, content_type: Option<&str>, bytes: &Bytes) -> Part {
    let base = || Part::stream(bytes.clone()).file_name(file_name.to_owned());
    match content_type {
        Some(ct) => base().mime_str(ct).unwrap_or_else(|_| base()),
        None => base(),
    }
}

/// Drop views older than the view TTL.
fn prune_expired(views: &mut HashMap<Uuid, ViewState>, now: DateTime<Utc>) {
    views.retain(|_, state| (now - state.created_at).num_seconds() < VIEW_TTL_SECS);
}
