use esmon::cli::Cli;
use esmon::commands::execute_command;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Set up colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    init_logging(cli.verbose);

    // Handle the command
    let result = execute_command(cli.command, cli.verbose);

    // Handle any errors
    if let Err(e) = result {
        eprintln!("{} {}", "Error:".bright_red().bold(), e);
        process::exit(1);
    }
}

/// `RUST_LOG` wins over the `--verbose` default
fn init_logging(verbose: bool) {
    let default = if verbose { "esmon=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
