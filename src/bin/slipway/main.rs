//! Slipway CLI - cross-compilation build matrix and release packaging

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, cli.verbose),
        Commands::Targets(args) => commands::targets::execute(args),
        Commands::Apps(args) => commands::apps::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
