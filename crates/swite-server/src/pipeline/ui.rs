//! Handler for `.ui`/`.uix` component sources.
//!
//! compile, strip stylesheet imports, normalize the framework prefix,
//! rewrite imports, cache, respond. Stylesheet imports are removed here,
//! before rewriting; the compiler's output occasionally re-emits them in
//! shapes a single pattern misses, so four passes run every time.

use axum::response::Response;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use swite_core::{normalize_framework_prefix, ImportRewriter};

use crate::pipeline::media::{not_found, script_response, server_error};
use crate::state::SharedState;

/// Line-anchored side-effect import of a stylesheet.
static STRIP_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+['"][^'"]*\.(?:css|scss|sass)['"]\s*;?[ \t]*\r?\n?"#)
        .expect("line-anchored stylesheet pattern")
});

/// Word-boundary side-effect import, wherever it sits on the line.
static STRIP_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+['"][^'"]*\.(?:css|scss|sass)['"]\s*;?"#)
        .expect("word-boundary stylesheet pattern")
});

/// Dynamic stylesheet import.
static STRIP_DYNAMIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s*\(\s*['"][^'"]*\.(?:css|scss|sass)['"]\s*\)\s*;?"#)
        .expect("dynamic stylesheet pattern")
});

/// Generic binding-form import (`import styles from './x.css'`).
static STRIP_GENERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\s+[^;'"]*?from\s*['"][^'"]*\.(?:css|scss|sass)['"]\s*;?"#)
        .expect("generic stylesheet pattern")
});

/// Remove every stylesheet import from compiled script.
pub fn strip_stylesheet_imports(script: &str) -> String {
    let script = STRIP_LINE_RE.replace_all(script, "");
    let script = STRIP_GENERIC_RE.replace_all(&script, "");
    let script = STRIP_WORD_RE.replace_all(&script, "");
    let script = STRIP_DYNAMIC_RE.replace_all(&script, "");
    script.into_owned()
}

/// Serve a compiled `.ui`/`.uix` module for `url`.
pub async fn handle(state: &SharedState, url: &str) -> Response {
    let path = state.resolver.ctx().resolve_file_path(url);

    if let Some(hit) = cached(state, &path) {
        return script_response(hit);
    }

    // At most one build per key; later requesters observe the winner.
    let lock = state.cache.build_lock(&path);
    let _guard = lock.lock().await;
    if let Some(hit) = cached(state, &path) {
        return script_response(hit);
    }

    let source = match tokio::fs::read_to_string(&path).await {
        Ok(source) => source,
        Err(_) => {
            tracing::warn!(url, path = %path.display(), stage = "resolve", "source not found");
            return not_found(url);
        }
    };

    let compiled = match state.compiler.compile(&source, &path).await {
        Ok(compiled) => compiled,
        Err(e) => {
            tracing::error!(url, path = %path.display(), stage = "compile", error = %e, "compile failed");
            return server_error(e.to_string());
        }
    };

    let compiled = strip_stylesheet_imports(&compiled);
    let compiled = normalize_framework_prefix(&compiled).into_owned();

    let rewriter = ImportRewriter::new(&state.resolver);
    let rewritten = rewriter.rewrite(&compiled, &path);
    let deps = state.resolved_deps(&compiled, &path);
    state.cache.set(&path, compiled, rewritten.clone(), deps);

    tracing::debug!(url, path = %path.display(), stage = "rewrite", "compiled and cached");
    script_response(rewritten)
}

fn cached(state: &SharedState, path: &Path) -> Option<String> {
    state
        .cache
        .get(path, |compiled| state.resolved_deps(compiled, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_side_effect_stylesheet_imports() {
        let script = "import './styles.css';\nimport { x } from './x.ts';\n";
        let out = strip_stylesheet_imports(script);
        assert!(!out.contains("styles.css"));
        assert!(out.contains("./x.ts"));
    }

    #[test]
    fn strips_binding_form_imports() {
        let script = "import styles from './button.css';\nconst a = 1;";
        let out = strip_stylesheet_imports(script);
        assert!(!out.contains("button.css"));
        assert!(out.contains("const a = 1;"));
    }

    #[test]
    fn strips_dynamic_imports() {
        let script = "await import('./theme.css');\nawait import('./mod.ts');";
        let out = strip_stylesheet_imports(script);
        assert!(!out.contains("theme.css"));
        assert!(out.contains("./mod.ts"));
    }

    #[test]
    fn strips_scss_and_sass_too() {
        let script = "import './a.scss'; import './b.sass';";
        let out = strip_stylesheet_imports(script);
        assert!(!out.contains(".scss"));
        assert!(!out.contains(".sass"));
    }

    #[test]
    fn strips_mid_line_imports() {
        let script = "const x = 1; import './late.css'; const y = 2;";
        let out = strip_stylesheet_imports(script);
        assert!(!out.contains("late.css"));
        assert!(out.contains("const x = 1;"));
        assert!(out.contains("const y = 2;"));
    }

    #[test]
    fn leaves_non_stylesheet_imports_alone() {
        let script = "import { a } from './a.ts';\nimport b from '@scope/pkg';\n";
        assert_eq!(strip_stylesheet_imports(script), script);
    }
}
