//! Command-line interface definition.
//!
//! Uses clap v4 derive macros for type-safe argument parsing.
//!
//! # Command Structure
//!
//! - `swite dev` - development server with hot reload
//! - `swite import-map` - pre-resolve packages into the import map

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Swite - development server for SwissJS applications
#[derive(Parser, Debug)]
#[command(
    name = "swite",
    version,
    about = "Development server for SwissJS applications",
    long_about = "Swite serves .ui/.uix component sources to the browser on demand:\n\
                  it compiles them through the configured compiler, rewrites every\n\
                  import to a fetchable URL, caches the result, and pushes hot-reload\n\
                  notifications when watched files change."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the development server
    Dev(DevArgs),

    /// Generate the import map for the application
    #[command(name = "import-map")]
    ImportMap(ImportMapArgs),
}

#[derive(Args, Debug)]
pub struct DevArgs {
    /// Application root directory (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Port to listen on; a busy port falls back to an ephemeral one
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Open the browser after the server starts
    #[arg(long)]
    pub open: bool,
}

#[derive(Args, Debug)]
pub struct ImportMapArgs {
    /// Application root directory (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub root: Option<PathBuf>,
}
