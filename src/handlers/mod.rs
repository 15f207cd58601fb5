//! HTTP handlers: server-rendered pages plus a small JSON surface.
//!
//! Pages are built by hand with string concatenation; everything user-
//! or backend-controlled passes through `html_escape` on the way in.

pub mod auth_handlers;
pub mod health_handlers;
pub mod upload_handlers;

use axum::response::Html;

/// Wrap page body markup in the shared document shell.
fn page(title: &str, body_markup: &str) -> Html<String> {
    Html(format!(
        concat!(
            "<!doctype html><html><head>",
            r#"<meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            "<title>{}</title>",
            "</head><body>{}</body></html>"
        ),
        html_escape(title),
        body_markup
    ))
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
