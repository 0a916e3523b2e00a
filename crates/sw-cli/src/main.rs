//! Stepwise CLI - versioned, resumable schema upgrades

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

mod cli;
mod commands;
mod context;
mod progress;

use cli::Cli;
use commands::{plan, run, status, versions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    match &cli.command {
        cli::Commands::Versions => versions::execute(&cli.global).await,
        cli::Commands::Status => status::execute(&cli.global).await,
        cli::Commands::Plan(args) => plan::execute(args, &cli.global).await,
        cli::Commands::Run(args) => run::execute(args, &cli.global).await,
    }
}
