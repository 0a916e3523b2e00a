//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Stepwise - versioned, resumable schema upgrades
#[derive(Parser, Debug)]
#[command(name = "sw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Target from the config's `targets` section
    #[arg(short, long, global = true, env = "SW_TARGET")]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered upgrade versions
    Versions,

    /// Show the installed version and pending upgrades
    Status,

    /// Show the tasks an upgrade would run
    Plan(PlanArgs),

    /// Apply pending upgrades
    Run(RunArgs),
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Target version (default: latest registered)
    #[arg(long)]
    pub to: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Target version (default: latest registered)
    #[arg(long)]
    pub to: Option<String>,

    /// Log each task instead of drawing a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
