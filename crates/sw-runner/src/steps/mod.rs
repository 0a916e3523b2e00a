//! Built-in step catalog.

mod six_two;

use crate::error::UpgradeResult;
use crate::registry::{RegistryBuilder, StepRegistry};
use crate::script::ScriptCatalog;
use std::path::PathBuf;

/// Builder preloaded with every built-in step.
pub fn builtin() -> RegistryBuilder {
    six_two::register(RegistryBuilder::new())
}

/// Built-in steps plus the scripts found in `script_dirs`.
pub fn registry(script_dirs: &[PathBuf]) -> UpgradeResult<StepRegistry> {
    let catalog = ScriptCatalog::discover(script_dirs)?;
    builtin().scripts(catalog).build()
}
