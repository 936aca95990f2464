//! Binary crate for the `weatherboard` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration and the interactive dashboard
//! - Human-friendly output formatting

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod interactive;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose);
    cmd.run().await
}

/// Logs go to stderr; stdout is reserved for the dashboard itself.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,weatherboard=debug,weatherboard_core=debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
