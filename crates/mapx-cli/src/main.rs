//! mapx CLI - Command-line utility for listing and exporting the resources
//! a map depends on.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let show_progress = !cli.quiet && !cli.json;

    match &cli.command {
        cli::Commands::Tree(args) => commands::tree::execute(args, &*formatter),
        cli::Commands::Export(args) => {
            commands::export::execute(args, &*formatter, show_progress)
        }
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    }
}

/// Logs go to stderr. `RUST_LOG` overrides the level chosen by the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "mapx_core=debug,mapx=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
