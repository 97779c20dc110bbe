//! Swite development server: request pipeline, file watcher and hot-reload
//! push channel.
//!
//! The engine (resolution, rewriting, caching) lives in `swite-core`; this
//! crate turns it into an HTTP server. External collaborators (the
//! `.ui`/`.uix` compiler, the TypeScript transformer, the route scanner)
//! are injected through the traits in [`compiler`].
//!
//! # Architecture
//!
//! - [`config`] - dev server configuration and port selection
//! - [`state`] - shared state constructed once at startup
//! - [`pipeline`] - per-extension request handlers
//! - [`watcher`] - debounced file watching
//! - [`hmr`] - change classification and the SSE push channel
//! - [`server`] - router assembly and serving

pub mod compiler;
pub mod config;
pub mod error;
pub mod hmr;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;
pub mod testing;
pub mod watcher;

pub use compiler::{
    CodeTransformer, CommandCompiler, CompileError, EmptyRouteScanner, Loader,
    PassthroughTransformer, RouteEntry, RouteScanner, UiCompiler, UnconfiguredCompiler,
};
pub use config::DevConfig;
pub use error::{ConfigError, Result, ServerError};
pub use hmr::{classify_change, UpdatePayload, UpdateType};
pub use server::{build_router, DevServer};
pub use state::{DevState, SharedState};
pub use watcher::{FileChange, FileWatcher};
