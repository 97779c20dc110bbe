//! Per-request compilation and rewrite pipeline.
//!
//! Requests are dispatched to an owning handler by URL prefix and
//! extension. A request for `X.js` that does not exist on disk is handed
//! to the handler of the first existing sibling in `{.ts, .ui, .uix}`
//! under the corrected URL.

pub mod js;
pub mod media;
pub mod node_modules;
pub mod ts;
pub mod ui;

use axum::{extract::State, http::Uri, response::Response};
use std::path::Path;

use crate::pipeline::media::{content_type_for, not_found, ok_response};
use crate::state::SharedState;

/// Axum fallback entry point.
pub async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    dispatch(&state, uri.path()).await
}

/// Route a URL to its owning handler.
pub async fn dispatch(state: &SharedState, url: &str) -> Response {
    if url.starts_with("/node_modules/") {
        return node_modules::handle(state, url).await;
    }

    // Static trees are never processed.
    if url.starts_with("/public/") || url.starts_with("/assets/") {
        return serve_static(state, url).await;
    }

    match url_extension(url).as_deref() {
        Some("ui") | Some("uix") => ui::handle(state, url).await,
        Some("ts") | Some("tsx") => ts::handle(state, url).await,
        Some("js") | Some("mjs") | Some("jsx") => js::handle(state, url).await,
        _ => serve_static(state, url).await,
    }
}

/// Serve a file with no processing. Misses are plain-text 404s, including
/// under `/swiss-packages/`; an HTML fallback there would poison caches.
async fn serve_static(state: &SharedState, url: &str) -> Response {
    let path = state.resolver.ctx().resolve_file_path(url);
    if !path.is_file() {
        return not_found(url);
    }
    match tokio::fs::read(&path).await {
        Ok(content) => ok_response(content_type_for(&path), content),
        Err(_) => not_found(url),
    }
}

/// Extension of the URL path, ignoring query and fragment.
pub fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Replace the extension of a URL path, keeping any query string.
pub fn swap_url_extension(url: &str, new_ext: &str) -> String {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };
    let swapped = match path.rfind('.') {
        Some(dot) => format!("{}.{}", &path[..dot], new_ext),
        None => format!("{path}.{new_ext}"),
    };
    match query {
        Some(query) => format!("{swapped}?{query}"),
        None => swapped,
    }
}
