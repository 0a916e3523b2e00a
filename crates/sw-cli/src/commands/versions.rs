//! Versions command implementation

use anyhow::Result;
use sw_runner::StepDefinition;

use crate::cli::GlobalArgs;
use crate::context::registry_for;

/// Execute the versions command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let registry = registry_for(global)?;
    if registry.is_empty() {
        println!("No upgrade steps registered.");
        return Ok(());
    }

    println!("{:<16} {:<8} SOURCE", "VERSION", "TASKS");
    for step in registry.steps() {
        let tasks = registry.resolve(step.version())?;
        println!(
            "{:<16} {:<8} {}",
            step.version().to_string(),
            tasks.len(),
            describe(step)
        );
    }
    Ok(())
}

fn describe(step: &StepDefinition) -> String {
    let script = step.script_source().map(|s| s.name());
    match (step.has_function(), script) {
        (true, Some(name)) if step.skips_script() => {
            format!("function (script {name} is NOT run)")
        }
        (true, Some(name)) => format!("function + {name}"),
        (true, None) => "function".to_string(),
        (false, Some(name)) => format!("script {name}"),
        (false, None) => "-".to_string(),
    }
}
