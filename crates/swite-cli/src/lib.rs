//! Swite CLI.
//!
//! Exposes the dev server from `swite-server` through a command-line
//! interface with structured logging and readable error messages.
//!
//! # Architecture
//!
//! - [`cli`] - clap command and argument definitions
//! - [`commands`] - command implementations
//! - [`error`] - CLI error types and miette bridging
//! - [`logger`] - tracing subscriber setup
//! - [`scanner`] - file-convention route scanner
//! - [`ui`] - terminal status messages

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod scanner;
pub mod ui;

pub use error::{CliError, Result};
