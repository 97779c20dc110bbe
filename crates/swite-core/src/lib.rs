//! Core engine of the Swite development server.
//!
//! Everything a request needs before it can be answered lives here:
//! workspace and package discovery, the path/URL canonicalizer, module
//! specifier resolution, the import rewriter, the compilation cache, and
//! the import-map generator. The HTTP pipeline, file watcher and push
//! channel build on these in `swite-server`.
//!
//! # Architecture
//!
//! - [`workspace`] - workspace root and framework monorepo discovery
//! - [`registry`] - name to package-directory index
//! - [`urls`] - filesystem path to browser URL mapping and back
//! - [`specifier`] - syntactic classification of import specifiers
//! - [`resolver`] - specifier to URL resolution with CDN fallback
//! - [`lexer`] / [`rewrite`] - static import enumeration and rewriting
//! - [`cache`] - dependency-aware compilation cache
//! - [`import_map`] - pre-resolved bare-specifier fast path

pub mod cache;
pub mod error;
pub mod import_map;
pub mod lexer;
pub mod manifest;
pub mod registry;
pub mod resolver;
pub mod rewrite;
pub mod specifier;
pub mod urls;
pub mod workspace;

pub use cache::{CacheEntry, CompilationCache, DEFAULT_CACHE_CAPACITY};
pub use error::{CoreError, Result, ResultExt};
pub use import_map::{ImportMap, ImportMapDocument, ImportMapGenerator};
pub use manifest::{split_specifier, PackageManifest};
pub use registry::PackageRegistry;
pub use resolver::{cdn_url, ModuleResolver, SOURCE_EXTENSIONS};
pub use rewrite::ImportRewriter;
pub use specifier::{classify, Specifier};
pub use urls::{normalize_framework_prefix, prefer_source, UrlContext, INTERNAL_PREFIX, PUBLIC_PREFIX};
pub use workspace::WorkspaceLocator;
