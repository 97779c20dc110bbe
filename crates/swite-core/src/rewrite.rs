//! Import rewriting: every static specifier becomes a fetchable URL.
//!
//! The rewrite runs in layers. A lexer-driven pass substitutes each
//! specifier through the resolver, then regex backstops catch what the
//! lexer missed: relative `.js` imports of files that only exist under a
//! source extension, residual internal framework prefixes, and bare scoped
//! specifiers. Each layer has caught real output the earlier layers missed;
//! all of them run on every rewrite.

use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use crate::lexer::{scan_imports, ImportSpan};
use crate::resolver::{cdn_url, ModuleResolver};
use crate::specifier::{classify, Specifier};
use crate::urls::{normalize_framework_prefix, PUBLIC_PREFIX};

/// Relative `.js` specifier in an import/from clause.
static RELATIVE_JS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:from\s*|import\s*\(\s*|import\s+)(['"])(\.{1,2}/[^'"]*?\.js)(['"])"#)
        .expect("relative .js pattern")
});

/// Bare scoped specifier in an import/from clause.
static BARE_SCOPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:from\s*|import\s*\(\s*|import\s+)(['"])(@[A-Za-z0-9~-][^'"]*)(['"])"#)
        .expect("bare scoped pattern")
});

/// Quoted specifier, used to recover bounds when a span disagrees with the
/// surrounding text.
fn quoted_spec_re(spec: &str) -> Regex {
    Regex::new(&format!(r#"(['"]){}(['"])"#, regex::escape(spec))).expect("quoted spec pattern")
}

/// Rewrites script text so every static specifier is browser-fetchable.
pub struct ImportRewriter<'a> {
    resolver: &'a ModuleResolver,
}

impl<'a> ImportRewriter<'a> {
    pub fn new(resolver: &'a ModuleResolver) -> Self {
        Self { resolver }
    }

    /// Rewrite `source` as imported from `importer`.
    ///
    /// Dynamic imports whose argument is not a string literal are left
    /// byte-identical. The operation is idempotent.
    pub fn rewrite(&self, source: &str, importer: &Path) -> String {
        let mut text = self.lexer_pass(source, importer);
        text = self.relative_js_backstop(&text, importer);
        text = normalize_framework_prefix(&text).into_owned();
        text = bare_scoped_backstop(&text);
        text
    }

    fn lexer_pass(&self, source: &str, importer: &Path) -> String {
        let spans = scan_imports(source);
        let mut text = source.to_string();

        for span in spans.iter().rev() {
            let spec = span.text(&text).to_string();
            // Stylesheet imports are stripped upstream; never touch them.
            if spec.contains(".css") {
                continue;
            }

            let (start, end) = match confirm_bounds(&text, span, &spec) {
                Some(bounds) => bounds,
                None => continue,
            };

            let normalized = normalize_framework_prefix(&spec);
            let replacement = match classify(&normalized) {
                Specifier::Relative(s) => {
                    let repaired = self.repair_relative(s, importer);
                    let spec_for_resolve = repaired.as_deref().unwrap_or(s);
                    Some(self.resolver.resolve(spec_for_resolve, importer))
                }
                Specifier::Bare(s) | Specifier::Scoped(s) => {
                    Some(self.resolver.resolve(s, importer))
                }
                Specifier::AbsoluteUrl(s) | Specifier::FrameworkPrefixed(s) => {
                    if s.starts_with(PUBLIC_PREFIX) {
                        // Round-trip through the canonicalizer so the
                        // source-over-built preference applies.
                        let path = self.resolver.ctx().resolve_file_path(s);
                        Some(self.resolver.ctx().to_url(&path.to_string_lossy()))
                    } else {
                        match &normalized {
                            Cow::Owned(changed) => Some(changed.clone()),
                            Cow::Borrowed(_) => None,
                        }
                    }
                }
                Specifier::Invalid(_) => None,
            };

            if let Some(new_spec) = replacement {
                if new_spec != spec {
                    tracing::debug!(from = %spec, to = %new_spec, "specifier rewritten");
                    text.replace_range(start..end, &new_spec);
                }
            }
        }
        text
    }

    /// Undo the compiler's `.js` extension on relative imports of source
    /// files. The importer's location picks exactly one replacement
    /// extension; a `.ui`/`.uix` importer always repairs to its own
    /// extension, so a sibling pair never resolves to the wrong twin.
    fn repair_relative(&self, spec: &str, importer: &Path) -> Option<String> {
        if !spec.ends_with(".js") {
            return None;
        }
        let dir = importer.parent()?;
        let joined = dir.join(spec);
        if joined.is_file() {
            return None;
        }

        let importer_ext = importer.extension().and_then(|e| e.to_str());
        let ext = if self.importer_in_framework(importer) {
            "ts"
        } else if importer_in_workspace_lib(importer) {
            "ts"
        } else if importer_ext == Some("ui") {
            "ui"
        } else if importer_ext == Some("uix") {
            "uix"
        } else {
            "ts"
        };

        if joined.with_extension(ext).is_file() {
            return Some(format!("{}.{}", &spec[..spec.len() - 3], ext));
        }
        None
    }

    fn importer_in_framework(&self, importer: &Path) -> bool {
        self.resolver
            .ctx()
            .framework_root
            .as_ref()
            .is_some_and(|root| importer.starts_with(root.join("packages")))
    }

    fn relative_js_backstop(&self, text: &str, importer: &Path) -> String {
        let mut replacements: Vec<(std::ops::Range<usize>, String)> = Vec::new();
        for caps in RELATIVE_JS_RE.captures_iter(text) {
            let spec_match = caps.get(2).expect("specifier group");
            if let Some(repaired) = self.repair_relative(spec_match.as_str(), importer) {
                replacements.push((spec_match.range(), repaired));
            }
        }
        splice_all(text, replacements)
    }
}

/// Force any bare scoped specifier the earlier passes missed onto the CDN.
fn bare_scoped_backstop(text: &str) -> String {
    let mut replacements: Vec<(std::ops::Range<usize>, String)> = Vec::new();
    for caps in BARE_SCOPED_RE.captures_iter(text) {
        let spec_match = caps.get(2).expect("specifier group");
        let spec = spec_match.as_str();
        if matches!(classify(spec), Specifier::Scoped(_)) {
            tracing::warn!(specifier = spec, "bare specifier survived rewrite, forcing CDN");
            replacements.push((spec_match.range(), cdn_url(spec)));
        }
    }
    splice_all(text, replacements)
}

fn importer_in_workspace_lib(importer: &std::path::Path) -> bool {
    importer.components().any(|c| c.as_os_str() == "lib")
}

fn splice_all(text: &str, mut replacements: Vec<(std::ops::Range<usize>, String)>) -> String {
    if replacements.is_empty() {
        return text.to_string();
    }
    replacements.sort_by_key(|(range, _)| range.start);
    let mut out = text.to_string();
    for (range, replacement) in replacements.into_iter().rev() {
        out.replace_range(range, &replacement);
    }
    out
}

/// Verify the span really sits inside its recorded quotes; when the
/// adjacent byte disagrees, recover the bounds with a narrow search.
fn confirm_bounds(text: &str, span: &ImportSpan, spec: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let quote_ok = span.start > 0
        && bytes.get(span.start - 1) == Some(&span.quote)
        && bytes.get(span.end) == Some(&span.quote);
    if quote_ok {
        return Some((span.start, span.end));
    }
    let found = quoted_spec_re(spec).find(text)?;
    Some((found.start() + 1, found.end() - 1))
}
