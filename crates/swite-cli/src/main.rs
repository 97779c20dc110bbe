//! Swite - development server for SwissJS applications.

use clap::Parser;
use miette::Result;
use swite_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args).await,
        cli::Command::ImportMap(map_args) => commands::import_map_execute(map_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
