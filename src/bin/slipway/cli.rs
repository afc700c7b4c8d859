//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Slipway - a cross-compilation build matrix and release packaging tool
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the package for every target of a host's matrix row
    Build(BuildArgs),

    /// List the target matrix
    Targets(TargetsArgs),

    /// Print the app entries of previously built targets
    Apps(AppsArgs),

    /// Generate shell completions for slipway itself
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Package source directory
    #[arg(long, default_value = ".")]
    pub source: PathBuf,

    /// Package (and binary) name; defaults to the source directory name
    #[arg(long)]
    pub name: Option<String>,

    /// Build host (defaults to the detected host)
    #[arg(long)]
    pub host: Option<String>,

    /// Specific targets to build (defaults to the host's full row)
    #[arg(long)]
    pub target: Vec<String>,

    /// Number of parallel target builds
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output directory, one install dir per target
    #[arg(long, default_value = "dist")]
    pub out: PathBuf,

    /// Alternative matrix file (TOML)
    #[arg(long)]
    pub matrix: Option<PathBuf>,

    /// Ignore file filtering the source tree while staging
    #[arg(long)]
    pub ignore_file: Option<PathBuf>,

    /// Allow building with a stale or missing lockfile
    #[arg(long)]
    pub no_locked: bool,

    /// Emit the build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct TargetsArgs {
    /// Only show the row for this build host
    #[arg(long)]
    pub host: Option<String>,

    /// Alternative matrix file (TOML)
    #[arg(long)]
    pub matrix: Option<PathBuf>,
}

#[derive(Args)]
pub struct AppsArgs {
    /// Output directory of a previous build
    #[arg(long, default_value = "dist")]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
