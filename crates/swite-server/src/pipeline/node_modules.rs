//! Handler for installed dependencies under `/node_modules/`.
//!
//! Package internals ship as-is, with no import rewriting. Missing files
//! fall back to a case-insensitive scan of their directory; an unknown
//! path whose first segment is a valid package name redirects to the CDN.

use axum::response::Response;
use std::path::Path;

use swite_core::resolver::case_insensitive_scan;
use swite_core::{cdn_url, classify, Specifier};

use crate::pipeline::media::{content_type_for, not_found, ok_response, redirect};
use crate::state::SharedState;

/// Serve an installed dependency file for `url`.
pub async fn handle(state: &SharedState, url: &str) -> Response {
    let path = state.resolver.ctx().resolve_file_path(url);

    if path.is_file() {
        return passthrough(&path, url).await;
    }

    if let Some(found) = case_insensitive_scan(&path) {
        if found.is_file() {
            return passthrough(&found, url).await;
        }
    }

    let spec = url
        .trim_start_matches("/node_modules/")
        .split(['?', '#'])
        .next()
        .unwrap_or("");
    match classify(spec) {
        Specifier::Bare(_) | Specifier::Scoped(_) => {
            let cdn = cdn_url(spec);
            tracing::warn!(url, cdn = %cdn, "node module missing on disk, redirecting to CDN");
            redirect(&cdn)
        }
        _ => not_found(url),
    }
}

async fn passthrough(path: &Path, url: &str) -> Response {
    match tokio::fs::read(path).await {
        Ok(content) => ok_response(content_type_for(path), content),
        Err(e) => {
            tracing::warn!(url, path = %path.display(), error = %e, "failed to read node module");
            not_found(url)
        }
    }
}
