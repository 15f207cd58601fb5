//! HTTP handlers for the upload page and the multipart submit.
//!
//! The page re-renders itself after every submit; the browser never
//! navigates away from it, success or failure.

use crate::errors::AppError;
use crate::middleware::OptionalSession;
use crate::models::session::Session;
use crate::state::AppState;
use axum::extract::{Multipart, Query, State};
use axum::response::{Html, IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

/// Query parameters for the upload page.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Project to attach uploads to; defaults to the configured one.
    pub project: Option<String>,
}

/// GET `/` — the upload page.
///
/// Renders signed in or out. A signed-out submit is a silent no-op, so
/// the page stays reachable and shows a sign-in link instead of the
/// session email.
pub async fn upload_page(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let project = query
        .project
        .unwrap_or_else(|| state.config.project_id.clone());
    let view = state.uploads.create_view();
    render_widget(&state, session.as_ref(), view, &project)
}

/// POST `/uploads` — relay a multipart submit to the file API.
///
/// Reads the hidden `view` and `project` fields plus the first `file`
/// part; further file parts are dropped unread. A submit without a
/// session, or with a session that carries no access token, issues no
/// backend request at all.
pub async fn upload_submit(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_submission(multipart).await?;
    let project = submission
        .project
        .unwrap_or_else(|| state.config.project_id.clone());
    let view = submission
        .view
        .unwrap_or_else(|| state.uploads.create_view());

    let Some(session) = session else {
        debug!("upload submitted without a session, dropped");
        return Ok(render_widget(&state, None, view, &project).into_response());
    };
    let Some(access_token) = session.access_token.clone() else {
        debug!("session carries no access token, upload dropped");
        return Ok(render_widget(&state, Some(&session), view, &project).into_response());
    };

    if let Some(file) = submission.file {
        let result = state
            .uploads
            .upload(
                &file.name,
                file.content_type.as_deref(),
                file.bytes,
                &project,
                &access_token,
            )
            .await;
        match result {
            Ok(uploaded) => state.uploads.record_success(view, uploaded),
            Err(err) => {
                debug!("upload of {} failed: {}", file.name, err);
                state.uploads.record_failure(view, err.to_string());
            }
        }
    }

    Ok(render_widget(&state, Some(&session), view, &project).into_response())
}

/// One parsed multipart submit.
struct Submission {
    view: Option<Uuid>,
    project: Option<String>,
    file: Option<SubmittedFile>,
}

struct SubmittedFile {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Pull the known fields out of the multipart stream.
///
/// Only the first named file part is buffered; later file parts and
/// unknown fields are skipped.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission {
        view: None,
        project: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("view") => {
                let value = field.text().await?;
                submission.view = Uuid::parse_str(value.trim()).ok();
            }
            Some("project") => {
                let value = field.text().await?;
                if !value.is_empty() {
                    submission.project = Some(value);
                }
            }
            Some("file") if submission.file.is_none() => {
                // A file input submitted with nothing selected arrives as
                // a part with an empty filename; that is "no file".
                let name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .filter(|n| !n.is_empty());
                let content_type = field.content_type().map(|ct| ct.to_string());
                let bytes = field.bytes().await?;
                if let Some(name) = name {
                    submission.file = Some(SubmittedFile {
                        name,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// Render the upload page: session line, error line, file picker, and
/// the view's upload list with download links.
fn render_widget(
    state: &AppState,
    session: Option<&Session>,
    view: Uuid,
    project: &str,
) -> Html<String> {
    let snapshot = state.uploads.snapshot(view);
    let mut body = String::from("<h1>Project files</h1>");

    match session {
        Some(session) => {
            body.push_str(&format!(
                "<p>Signed in as {}</p>",
                super::html_escape(&session.user.email)
            ));
            body.push_str(concat!(
                r#"<form method="post" action="/logout">"#,
                r#"<button type="submit">Sign out</button>"#,
                "</form>"
            ));
        }
        None => body.push_str(r#"<p><a href="/login">Sign in</a> to upload files.</p>"#),
    }

    if let Some(error) = &snapshot.error {
        body.push_str(&format!(
            r#"<p class="error">{}</p>"#,
            super::html_escape(error)
        ));
    }

    body.push_str(&format!(
        concat!(
            r#"<form method="post" action="/uploads" enctype="multipart/form-data">"#,
            r#"<input type="hidden" name="view" value="{}">"#,
            r#"<input type="hidden" name="project" value="{}">"#,
            r#"<input type="file" name="file" accept="image/*,application/pdf,text/*">"#,
            r#"<button type="submit">Upload</button>"#,
            "</form>"
        ),
        view,
        super::html_escape(project)
    ));

    body.push_str(r#"<ul class="files">"#);
    for file in &snapshot.files {
        body.push_str(&format!(
            r#"<li><a href="{}" download>{}</a></li>"#,
            super::html_escape(&state.uploads.download_url(file)),
            super::html_escape(&file.original_name)
        ));
    }
    body.push_str("</ul>");

    super::page("Project files", &body)
}
