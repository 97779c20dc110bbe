//! Handler for plain `.js`/`.mjs`/`.jsx` sources.
//!
//! Reads the file and runs the import rewriter only; no compilation. When
//! the file is absent, siblings are tried in the order `.ts`, `.ui`,
//! `.uix` and the hit is delegated to its owning handler.

use axum::response::Response;

use swite_core::ImportRewriter;

use crate::pipeline::media::{content_type_for, not_found, ok_response};
use crate::pipeline::{swap_url_extension, ts, ui};
use crate::state::SharedState;

/// Serve a JavaScript module for `url`, rewriting its imports.
pub async fn handle(state: &SharedState, url: &str) -> Response {
    let path = state.resolver.ctx().resolve_file_path(url);

    if !path.is_file() {
        if path.with_extension("ts").is_file() {
            let corrected = swap_url_extension(url, "ts");
            tracing::debug!(from = url, to = %corrected, "delegating to ts handler");
            return ts::handle(state, &corrected).await;
        }
        for ext in ["ui", "uix"] {
            if path.with_extension(ext).is_file() {
                let corrected = swap_url_extension(url, ext);
                tracing::debug!(from = url, to = %corrected, "delegating to component handler");
                return ui::handle(state, &corrected).await;
            }
        }
        tracing::warn!(url, path = %path.display(), stage = "resolve", "source not found");
        return not_found(url);
    }

    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(_) => return not_found(url),
    };

    let rewriter = ImportRewriter::new(&state.resolver);
    let rewritten = rewriter.rewrite(&source, &path);
    ok_response(content_type_for(&path), rewritten.into_bytes())
}
