//! Version step registry.
//!
//! Maps each upgrade version to exactly one [`StepDefinition`]. A step owns a
//! step function, a SQL script, or both:
//!
//! - script only: the step runs as a single script task;
//! - function: the function's task list is used as-is, and the function must
//!   queue the script itself (see [`TaskList::run_sql`]). A step whose
//!   function does not do so never runs its script; this is reported by
//!   [`StepDefinition::skips_script`] and logged when the registry is built.
//!
//! The registry is assembled once through [`RegistryBuilder`]. Every problem
//! with a registration is reported by [`RegistryBuilder::build`], never later.
//!
//! [`TaskList::run_sql`]: crate::queue::TaskList::run_sql

use crate::error::{UpgradeError, UpgradeResult};
use crate::queue::script_label;
use crate::script::ScriptCatalog;
use crate::task::{ScriptSource, Task};
use std::collections::BTreeMap;
use std::fmt;
use sw_core::Version;

/// A step function: pure, returns the version's tasks in order.
pub type StepFn = fn(&Version) -> Vec<Task>;

/// Everything registered for one version.
#[derive(Clone)]
pub struct StepDefinition {
    version: Version,
    function: Option<StepFn>,
    script: Option<ScriptSource>,
    pre_message: Option<String>,
    post_message: Option<String>,
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("version", &self.version)
            .field("function", &self.function.is_some())
            .field("script", &self.script.as_ref().map(ScriptSource::name))
            .finish()
    }
}

impl StepDefinition {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            function: None,
            script: None,
            pre_message: None,
            post_message: None,
        }
    }

    pub fn function(mut self, f: StepFn) -> Self {
        self.function = Some(f);
        self
    }

    pub fn script(mut self, source: ScriptSource) -> Self {
        self.script = Some(source);
        self
    }

    /// Text shown before the upgrade starts
    pub fn pre_message(mut self, text: impl Into<String>) -> Self {
        self.pre_message = Some(text.into());
        self
    }

    /// Text shown after the upgrade finishes
    pub fn post_message(mut self, text: impl Into<String>) -> Self {
        self.post_message = Some(text.into());
        self
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn has_function(&self) -> bool {
        self.function.is_some()
    }

    pub fn script_source(&self) -> Option<&ScriptSource> {
        self.script.as_ref()
    }

    pub fn pre_upgrade_message(&self) -> Option<&str> {
        self.pre_message.as_deref()
    }

    pub fn post_upgrade_message(&self) -> Option<&str> {
        self.post_message.as_deref()
    }

    /// Whether only a script is registered.
    pub fn is_script_only(&self) -> bool {
        self.function.is_none() && self.script.is_some()
    }

    /// The step has a script but its function never queues a script task.
    pub fn skips_script(&self) -> bool {
        match (self.function, &self.script) {
            (Some(f), Some(_)) => !f(&self.version).iter().any(Task::is_script),
            _ => false,
        }
    }

    /// Task list before script references are resolved.
    fn raw_tasks(&self) -> Vec<Task> {
        match (self.function, &self.script) {
            (Some(f), _) => f(&self.version),
            (None, Some(source)) => vec![Task::RunScript {
                label: script_label(&self.version),
                script: source.clone(),
            }],
            (None, None) => Vec::new(),
        }
    }
}

/// Collects step definitions and discovered scripts.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    steps: Vec<StepDefinition>,
    scripts: Vec<(Version, ScriptSource)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Register a step function for `version`.
    pub fn function(self, version: Version, f: StepFn) -> Self {
        self.step(StepDefinition::new(version).function(f))
    }

    /// Attach a script to `version`, creating a script-only step if no step
    /// is registered for it.
    pub fn script(mut self, version: Version, source: ScriptSource) -> Self {
        self.scripts.push((version, source));
        self
    }

    /// Attach every script found on disk.
    pub fn scripts(mut self, catalog: ScriptCatalog) -> Self {
        self.scripts.extend(catalog.into_sources());
        self
    }

    /// Validate every registration and assemble the registry.
    pub fn build(self) -> UpgradeResult<StepRegistry> {
        let mut steps: BTreeMap<Version, StepDefinition> = BTreeMap::new();

        for step in self.steps {
            if steps.contains_key(&step.version) {
                return Err(registration(&step.version, "registered more than once"));
            }
            steps.insert(step.version.clone(), step);
        }

        for (version, source) in self.scripts {
            let step = steps
                .entry(version.clone())
                .or_insert_with(|| StepDefinition::new(version.clone()));
            if let Some(existing) = &step.script {
                return Err(registration(
                    &version,
                    &format!(
                        "has two scripts: {} and {}",
                        existing.name(),
                        source.name()
                    ),
                ));
            }
            step.script = Some(source);
        }

        for step in steps.values() {
            validate_step(step, &steps)?;
        }

        log::debug!("Registered {} upgrade step(s)", steps.len());
        Ok(StepRegistry { steps })
    }
}

fn registration(version: &Version, message: &str) -> UpgradeError {
    UpgradeError::Registration {
        version: version.to_string(),
        message: message.to_string(),
    }
}

fn validate_step(
    step: &StepDefinition,
    steps: &BTreeMap<Version, StepDefinition>,
) -> UpgradeResult<()> {
    if step.function.is_none() && step.script.is_none() {
        return Err(registration(
            &step.version,
            "has neither a step function nor a script",
        ));
    }
    if let Some(ScriptSource::Step(_)) = step.script {
        return Err(registration(
            &step.version,
            "a step's own script cannot refer to another step",
        ));
    }

    for task in step.raw_tasks() {
        match &task {
            Task::AlterColumn {
                table,
                column,
                spec,
                ..
            } => spec
                .check(table, column)
                .map_err(UpgradeError::from_spec_check)?,
            Task::RunScript {
                script: ScriptSource::Step(target),
                ..
            } => {
                if steps.get(target).and_then(|s| s.script.as_ref()).is_none() {
                    return Err(registration(
                        &step.version,
                        &format!("queues the script of {target}, which has none"),
                    ));
                }
            }
            _ => {}
        }
    }

    if step.skips_script() {
        log::warn!(
            "Step {} has a script but its function does not queue it; the script will not run",
            step.version
        );
    }
    Ok(())
}

/// Immutable map from version to step.
#[derive(Debug)]
pub struct StepRegistry {
    steps: BTreeMap<Version, StepDefinition>,
}

impl StepRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Ordered task list for `version`, with script references resolved.
    pub fn resolve(&self, version: &Version) -> UpgradeResult<Vec<Task>> {
        let step = self.step(version).ok_or_else(|| UpgradeError::NotFound {
            version: version.to_string(),
        })?;

        let tasks = step
            .raw_tasks()
            .into_iter()
            .map(|task| match task {
                Task::RunScript {
                    label,
                    script: ScriptSource::Step(target),
                } => {
                    let script = self
                        .steps
                        .get(&target)
                        .and_then(|s| s.script.clone())
                        .unwrap_or(ScriptSource::Step(target));
                    Task::RunScript { label, script }
                }
                other => other,
            })
            .collect();
        Ok(tasks)
    }

    pub fn step(&self, version: &Version) -> Option<&StepDefinition> {
        self.steps.get(version)
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.steps.contains_key(version)
    }

    /// Registered versions, ascending.
    pub fn versions(&self) -> Vec<&Version> {
        self.steps.keys().collect()
    }

    pub fn latest(&self) -> Option<&Version> {
        self.steps.keys().next_back()
    }

    /// Registered versions in `(from, to]`, ascending. `None` means from the
    /// very beginning.
    pub fn between(&self, from: Option<&Version>, to: &Version) -> Vec<&Version> {
        self.steps
            .keys()
            .filter(|v| from.map_or(true, |f| *v > f) && *v <= to)
            .collect()
    }

    pub fn steps(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.values()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
