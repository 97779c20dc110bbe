//! Handler for `.ts`/`.tsx` sources.
//!
//! Same skeleton as the component handler, with the external code
//! transformer in place of the compiler. A missing `.ts` whose `.ui` or
//! `.uix` sibling exists is delegated to the component handler under the
//! corrected URL.

use axum::response::Response;
use std::path::Path;

use swite_core::ImportRewriter;

use crate::compiler::Loader;
use crate::pipeline::media::{not_found, script_response, server_error};
use crate::pipeline::{swap_url_extension, ui};
use crate::state::SharedState;

/// Serve a transformed TypeScript module for `url`.
pub async fn handle(state: &SharedState, url: &str) -> Response {
    let path = state.resolver.ctx().resolve_file_path(url);

    if !path.is_file() {
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

    if let Some(hit) = cached(state, &path) {
        return script_response(hit);
    }

    let lock = state.cache.build_lock(&path);
    let _guard = lock.lock().await;
    if let Some(hit) = cached(state, &path) {
        return script_response(hit);
    }

    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(_) => return not_found(url),
    };

    let loader = Loader::for_path(&path);
    let transformed = match state.transformer.transform(&source, &path, loader).await {
        Ok(transformed) => transformed,
        Err(e) => {
            tracing::error!(url, path = %path.display(), stage = "compile", error = %e, "transform failed");
            return server_error(e.to_string());
        }
    };

    let rewriter = ImportRewriter::new(&state.resolver);
    let rewritten = rewriter.rewrite(&transformed, &path);
    let deps = state.resolved_deps(&transformed, &path);
    state.cache.set(&path, transformed, rewritten.clone(), deps);

    script_response(rewritten)
}

fn cached(state: &SharedState, path: &Path) -> Option<String> {
    state
        .cache
        .get(path, |compiled| state.resolved_deps(compiled, path))
}
