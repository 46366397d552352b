use anyhow::{Context, Result};
use clap::Parser;
use smsb::{
    cli::{Cli, Commands},
    config::Config,
    release::{ReleaseOptions, ReleaseService},
    worker,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = Config::load()?;
            worker::run(&config).await?;
        }
        Commands::Release {
            path,
            platform,
            no_push,
            repo,
            branch,
            cargo_args,
        } => {
            let config = Config::load()?;

            let repository = repo
                .or(config.repository)
                .context("Either --repo or SMSB_REPO must be set")?;

            let options = ReleaseOptions {
                project_path: path.unwrap_or(config.project_path),
                repository,
                platforms: platform.unwrap_or(config.platforms),
                publish_branch: branch.unwrap_or(config.publish_branch),
                no_push,
                cargo_args,
            };

            let outcome = ReleaseService::run(options).await?;

            // Print only the published references to stdout
            for reference in &outcome.published {
                println!("{}", reference);
            }
        }
        Commands::Version => {
            println!("smsb {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
