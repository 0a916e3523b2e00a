//! Status command implementation

use anyhow::{Context, Result};
use sw_runner::Journal;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the status command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let status = ctx
        .upgrader()
        .status()
        .await
        .context("Failed to read upgrade journal")?;

    match &status.installed {
        Some(v) => println!("Installed version: {v}"),
        None => println!("Installed version: (none)"),
    }
    if let Some(latest) = &status.latest {
        println!("Latest version:    {latest}");
    }

    let history = Journal::new(ctx.db.as_ref())
        .history()
        .await
        .context("Failed to read upgrade history")?;
    if !history.is_empty() {
        println!("Applied:");
        for (version, applied_at) in &history {
            match applied_at {
                Some(at) => println!("  {version:<16} {}", at.format("%Y-%m-%d %H:%M:%S")),
                None => println!("  {version}"),
            }
        }
    }

    if status.is_current() {
        println!("Schema is up to date.");
        return Ok(());
    }

    println!("Pending ({}):", status.pending.len());
    for version in &status.pending {
        println!("  {version}");
    }
    Ok(())
}
