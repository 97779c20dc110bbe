//! CLI error type and miette bridging.

use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Dev server failures (config, transport, watcher, compile)
    #[error(transparent)]
    Server(#[from] swite_server::ServerError),

    /// Resolution engine failures
    #[error(transparent)]
    Core(#[from] swite_core::CoreError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Convert a CLI error into a miette report for terminal rendering.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    miette::Report::msg(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_convert() {
        let err: CliError =
            swite_server::ServerError::Server("bind failed".to_string()).into();
        assert!(err.to_string().contains("bind failed"));
    }

    #[test]
    fn miette_report_keeps_message() {
        let report = cli_error_to_miette(CliError::InvalidArgument("bad port".to_string()));
        assert!(report.to_string().contains("bad port"));
    }
}
