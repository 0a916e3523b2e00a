//! Plan command implementation

use anyhow::{Context, Result};
use sw_core::plan_fingerprint;

use crate::cli::{GlobalArgs, PlanArgs};
use crate::context::RuntimeContext;

/// Execute the plan command
pub async fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let target = ctx.target_version(args.to.as_deref())?;
    let plan = ctx
        .upgrader()
        .plan(&target)
        .await
        .with_context(|| format!("Failed to plan upgrade to {target}"))?;

    if plan.is_empty() {
        println!("Schema is already at {target}; nothing to do.");
        return Ok(());
    }

    let mut labels = Vec::new();
    for planned in &plan {
        println!("{} ({} tasks)", planned.version, planned.tasks.len());
        for (index, task) in planned.tasks.iter().enumerate() {
            let marker = if index < planned.resume_at { "done" } else { "    " };
            println!("  [{marker}] {index:>2} {:<6} {}", task.kind(), task.label());
            labels.push(format!("{}/{}", planned.version, task.label()));
        }
    }

    let remaining: usize = plan.iter().map(|p| p.remaining()).sum();
    println!();
    println!("{remaining} task(s) to run across {} version(s)", plan.len());
    println!("Plan fingerprint: {}", &plan_fingerprint(&labels)[..16]);
    Ok(())
}
