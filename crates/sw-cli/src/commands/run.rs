//! Run command implementation

use anyhow::{Context, Result};
use std::sync::Arc;
use sw_runner::Warning;

use crate::cli::{GlobalArgs, RunArgs};
use crate::context::RuntimeContext;
use crate::progress::BarProgress;

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let target = ctx.target_version(args.to.as_deref())?;

    let mut run_ctx = ctx.upgrade_context();
    if !args.no_progress {
        run_ctx = run_ctx.with_progress(Arc::new(BarProgress::new()));
    }

    log::info!("Upgrading '{}' to {target}", ctx.config.name);
    let result = ctx.upgrader().run(&target, &mut run_ctx).await;
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            print_warnings(run_ctx.warnings());
            return Err(e).with_context(|| format!("Upgrade to {target} failed; re-run to resume"));
        }
    };

    println!(
        "Done: {} task(s) run, {} already applied, {} unchanged",
        summary.executed, summary.skipped, summary.unchanged
    );
    print_warnings(&summary.warnings);
    Ok(())
}

fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!("Warnings ({}):", warnings.len());
    for warning in warnings {
        println!("  {warning}");
    }
}
