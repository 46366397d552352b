use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smsb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // No subcommand starts the worker, so the bare binary works as a
    // container entrypoint.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Bovespa monitor worker
    Run,

    /// Build multi-arch container images and publish them when on the release branch
    Release {
        /// Path to the project to build
        #[arg(value_name = "DIRECTORY")]
        path: Option<PathBuf>,

        /// Target platforms (e.g., linux/amd64, linux/arm64)
        /// Can be specified multiple times or as a comma-separated list
        #[arg(long, value_delimiter = ',')]
        platform: Option<Vec<String>>,

        /// Build only; never push, regardless of branch
        #[arg(long)]
        no_push: bool,

        /// Repository to publish to (e.g., ghcr.io/owner/smsb)
        #[arg(long, env = "SMSB_REPO")]
        repo: Option<String>,

        /// Branch that is allowed to publish (defaults to the configured publish branch)
        #[arg(long)]
        branch: Option<String>,

        /// Additional cargo build arguments
        #[arg(last = true)]
        cargo_args: Vec<String>,
    },

    /// Show version information
    Version,
}
