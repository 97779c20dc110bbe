//! Module specifier classification.
//!
//! A specifier found in source text is classified before any resolution is
//! attempted. Strings that look like variable references (property access
//! such as `def.componentUrl`) must be left untouched, so classification is
//! purely syntactic and errs toward `Invalid`.

use regex::Regex;
use std::sync::LazyLock;

use crate::urls::INTERNAL_PREFIX;

/// Package identifier, optionally scoped, optionally followed by a subpath.
/// Subpath segments may contain dots (`@scope/pkg/a.b/c` is valid).
static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[a-zA-Z0-9~-][a-zA-Z0-9._~-]*/)?[a-zA-Z0-9~-][a-zA-Z0-9._~-]*(/[a-zA-Z0-9._~-]+)*$")
        .expect("package specifier pattern")
});

/// Classification of an import specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier<'a> {
    /// Begins with `.`: resolved against the importer's directory
    Relative(&'a str),
    /// Begins with `/` (or a full `http(s)` URL): already browser-resolvable
    AbsoluteUrl(&'a str),
    /// Bare package name, e.g. `lodash` or `lodash/fp`
    Bare(&'a str),
    /// Scoped package name, e.g. `@swissjs/core`
    Scoped(&'a str),
    /// Begins with the internal framework prefix; must be rewritten to the
    /// public prefix
    FrameworkPrefixed(&'a str),
    /// Anything else, including variable references; left alone
    Invalid(&'a str),
}

/// Classify a specifier string.
pub fn classify(spec: &str) -> Specifier<'_> {
    if spec.is_empty() {
        return Specifier::Invalid(spec);
    }

    if spec.starts_with('.') {
        return Specifier::Relative(spec);
    }

    if spec.starts_with("http://") || spec.starts_with("https://") {
        return Specifier::AbsoluteUrl(spec);
    }

    if spec
        .get(..INTERNAL_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(INTERNAL_PREFIX))
    {
        return Specifier::FrameworkPrefixed(spec);
    }

    if spec.starts_with('/') {
        return Specifier::AbsoluteUrl(spec);
    }

    if spec.starts_with('@') {
        return if PACKAGE_RE.is_match(spec) {
            Specifier::Scoped(spec)
        } else {
            Specifier::Invalid(spec)
        };
    }

    // A dot in an unscoped candidate means a variable reference
    // (`def.componentUrl`), unless the tail is a recognized source
    // extension on an otherwise valid identifier.
    if spec.contains('.') && !has_recognized_extension(spec) {
        return Specifier::Invalid(spec);
    }

    if spec.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) && PACKAGE_RE.is_match(spec) {
        return Specifier::Bare(spec);
    }

    Specifier::Invalid(spec)
}

/// Extensions a specifier may legitimately end with.
pub const RECOGNIZED_EXTENSIONS: &[&str] =
    &[".ui", ".uix", ".ts", ".tsx", ".js", ".jsx", ".mjs", ".json"];

fn has_recognized_extension(spec: &str) -> bool {
    RECOGNIZED_EXTENSIONS.iter().any(|ext| spec.ends_with(ext))
}
