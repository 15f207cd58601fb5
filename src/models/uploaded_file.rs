//! A file record as the backend file API reports it.

use serde::{Deserialize, Serialize};

/// Metadata for one uploaded file, parsed from the file API response.
///
/// Only `id` and `originalName` are guaranteed by the backend; the
/// remaining fields are kept when present.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Backend-assigned file identifier, used in download URLs.
    pub id: String,

    /// Filename as originally submitted.
    pub original_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}
