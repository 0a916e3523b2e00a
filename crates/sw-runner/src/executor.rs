//! Sequential task executor.
//!
//! Tasks run one at a time in list order. The first failure stops the run;
//! the error names the failing task's index and label and wraps the cause.
//! Nothing is retried.

use crate::alter::{apply_alter, AlterOutcome};
use crate::context::{UpgradeContext, Warning};
use crate::error::{UpgradeError, UpgradeResult};
use crate::journal::Journal;
use crate::script;
use crate::task::Task;
use sw_core::compute_checksum;
use sw_db::Database;

/// Result of a completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks that ran
    pub executed: usize,
    /// Alter tasks that found nothing to change (included in `executed`)
    pub unchanged: usize,
    /// Leading tasks skipped because they had already committed
    pub skipped: usize,
    pub warnings: Vec<Warning>,
}

impl RunSummary {
    pub(crate) fn absorb(&mut self, other: RunSummary) {
        self.executed += other.executed;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.warnings.extend(other.warnings);
    }
}

enum TaskOutcome {
    Executed,
    Unchanged,
}

/// Runs task lists against one database.
pub struct Executor<'a> {
    db: &'a dyn Database,
    journal: Option<Journal<'a>>,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db, journal: None }
    }

    /// Record every committed task in `journal` under the context's version.
    pub fn with_journal(mut self, journal: Journal<'a>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub async fn run(&self, tasks: &[Task], ctx: &mut UpgradeContext) -> UpgradeResult<RunSummary> {
        self.run_from(tasks, 0, ctx).await
    }

    /// Run `tasks`, skipping the first `start` of them.
    pub async fn run_from(
        &self,
        tasks: &[Task],
        start: usize,
        ctx: &mut UpgradeContext,
    ) -> UpgradeResult<RunSummary> {
        validate_specs(tasks)?;

        let mut summary = RunSummary::default();
        for (index, task) in tasks.iter().enumerate() {
            let label = task.label();
            if index < start {
                ctx.progress().task_skipped(index, label);
                summary.skipped += 1;
                continue;
            }

            ctx.progress().task_started(index, label);
            log::debug!("Running task {index} ({}): {label}", task.kind());

            let outcome =
                self.run_task(task, ctx)
                    .await
                    .map_err(|source| UpgradeError::TaskFailed {
                        index,
                        label: label.to_string(),
                        source: Box::new(source),
                    })?;

            if let (Some(journal), Some(version)) = (&self.journal, ctx.version()) {
                journal.record_task(version, index, label, ctx.now()).await?;
            }

            ctx.progress().task_finished(index, label);
            summary.executed += 1;
            if matches!(outcome, TaskOutcome::Unchanged) {
                summary.unchanged += 1;
            }
        }

        summary.warnings = ctx.take_warnings();
        Ok(summary)
    }

    async fn run_task(&self, task: &Task, ctx: &mut UpgradeContext) -> UpgradeResult<TaskOutcome> {
        match task {
            Task::RunScript { script: source, .. } => {
                let sql = script::prepare(source, ctx)?;
                if sql.trim().is_empty() {
                    log::debug!("Script {} is empty", source.name());
                    return Ok(TaskOutcome::Executed);
                }
                let checksum = compute_checksum(&sql);
                log::debug!(
                    "Executing script {} (sha256 {})",
                    source.name(),
                    &checksum[..12]
                );
                self.db.execute_batch(&sql).await?;
                Ok(TaskOutcome::Executed)
            }
            Task::AlterColumn {
                table,
                column,
                spec,
                ..
            } => match apply_alter(self.db, table, column, spec).await? {
                AlterOutcome::Unchanged => Ok(TaskOutcome::Unchanged),
                _ => Ok(TaskOutcome::Executed),
            },
            Task::CustomAction { action, args, .. } => {
                action.run(ctx, self.db, args).await?;
                Ok(TaskOutcome::Executed)
            }
        }
    }
}

/// Check every alter spec before anything runs.
pub fn validate_specs(tasks: &[Task]) -> UpgradeResult<()> {
    for task in tasks {
        if let Task::AlterColumn {
            table,
            column,
            spec,
            ..
        } = task
        {
            spec.check(table, column)
                .map_err(UpgradeError::from_spec_check)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
