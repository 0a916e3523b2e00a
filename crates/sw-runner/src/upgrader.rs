//! Multi-version upgrade driver.
//!
//! Plans every registered version between the installed one and the target,
//! then runs each through the [`Executor`] while the [`Journal`] records
//! committed tasks. A re-invoked upgrade resumes after the last committed
//! task of the interrupted version.

use crate::context::UpgradeContext;
use crate::error::{UpgradeError, UpgradeResult};
use crate::executor::{Executor, RunSummary};
use crate::journal::Journal;
use crate::registry::StepRegistry;
use crate::task::Task;
use sw_core::Version;
use sw_db::Database;

/// One version queued for application.
#[derive(Debug)]
pub struct PlannedVersion {
    pub version: Version,
    pub tasks: Vec<Task>,
    /// Leading tasks already committed by an earlier, interrupted run
    pub resume_at: usize,
}

impl PlannedVersion {
    pub fn remaining(&self) -> usize {
        self.tasks.len().saturating_sub(self.resume_at)
    }
}

/// Installed and pending versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeStatus {
    pub installed: Option<Version>,
    pub latest: Option<Version>,
    /// Registered versions newer than `installed`, ascending
    pub pending: Vec<Version>,
}

impl UpgradeStatus {
    pub fn is_current(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies registered steps to one database.
pub struct Upgrader<'a> {
    registry: &'a StepRegistry,
    db: &'a dyn Database,
}

impl<'a> Upgrader<'a> {
    pub fn new(registry: &'a StepRegistry, db: &'a dyn Database) -> Self {
        Self { registry, db }
    }

    fn journal(&self) -> Journal<'a> {
        Journal::new(self.db)
    }

    /// Read-only: a database without a journal reports nothing installed.
    pub async fn status(&self) -> UpgradeResult<UpgradeStatus> {
        let journal = self.journal();
        let installed = journal.installed_version().await?;
        let latest = self.registry.latest().cloned();
        let pending = match &latest {
            Some(latest) => self
                .registry
                .between(installed.as_ref(), latest)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(UpgradeStatus {
            installed,
            latest,
            pending,
        })
    }

    /// Versions in `(installed, target]` with their tasks and resume points.
    pub async fn plan(&self, target: &Version) -> UpgradeResult<Vec<PlannedVersion>> {
        if !self.registry.contains(target) {
            return Err(UpgradeError::NotFound {
                version: target.to_string(),
            });
        }

        let journal = self.journal();
        let installed = journal.installed_version().await?;
        if let Some(installed) = &installed {
            if installed > target {
                return Err(UpgradeError::Downgrade {
                    installed: installed.to_string(),
                    target: target.to_string(),
                });
            }
        }

        let mut plan = Vec::new();
        for version in self.registry.between(installed.as_ref(), target) {
            let tasks = self.registry.resolve(version)?;
            let resume_at = journal.resume_point(version, &tasks).await?;
            plan.push(PlannedVersion {
                version: version.clone(),
                tasks,
                resume_at,
            });
        }
        Ok(plan)
    }

    /// Upgrade to `target`, resuming an interrupted run if there is one.
    pub async fn run(
        &self,
        target: &Version,
        ctx: &mut UpgradeContext,
    ) -> UpgradeResult<RunSummary> {
        let plan = self.plan(target).await?;
        self.journal().ensure().await?;
        let mut total = RunSummary::default();
        if plan.is_empty() {
            log::info!("Schema is already at {target}");
            return Ok(total);
        }

        for planned in &plan {
            if let Some(text) = self
                .registry
                .step(&planned.version)
                .and_then(|s| s.pre_upgrade_message())
            {
                ctx.progress().message(text);
            }
        }

        let journal = self.journal();
        for planned in &plan {
            let version = &planned.version;
            ctx.set_version(Some(version.clone()));
            ctx.progress().version_started(version, planned.tasks.len());
            if planned.resume_at > 0 {
                log::info!(
                    "Resuming {version} after {} committed task(s)",
                    planned.resume_at
                );
            }

            let applied = match Executor::new(self.db)
                .with_journal(self.journal())
                .run_from(&planned.tasks, planned.resume_at, ctx)
                .await
            {
                Ok(summary) => journal
                    .record_version(version, ctx.now())
                    .await
                    .map(|()| summary),
                Err(e) => Err(e),
            };
            let summary = match applied {
                Ok(summary) => summary,
                Err(e) => {
                    // warnings from versions already applied stay reportable
                    ctx.restore_warnings(std::mem::take(&mut total.warnings));
                    ctx.progress().version_failed(version, &e.to_string());
                    return Err(e);
                }
            };

            ctx.progress().version_finished(version);
            total.absorb(summary);
        }
        ctx.set_version(None);

        for planned in &plan {
            if let Some(text) = self
                .registry
                .step(&planned.version)
                .and_then(|s| s.post_upgrade_message())
            {
                ctx.progress().message(text);
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
#[path = "upgrader_test.rs"]
mod tests;
