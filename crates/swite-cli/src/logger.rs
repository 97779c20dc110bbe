//! Logging setup on the `tracing` ecosystem.
//!
//! # Verbosity Levels
//!
//! 1. `--verbose`: DEBUG for swite crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG` environment variable: custom filter
//! 4. Default: INFO for swite crates

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. Call once at startup.
///
/// # Arguments
///
/// * `verbose` - Enable debug-level logging (overrides `quiet`)
/// * `quiet` - Only show error-level logs
/// * `no_color` - Disable colored output
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("swite_core=debug,swite_server=debug,swite_cli=debug")
    } else if quiet {
        EnvFilter::new("swite_core=error,swite_server=error,swite_cli=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("swite_core=info,swite_server=info,swite_cli=info")
        })
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
