//! Durable record of applied versions and committed tasks.
//!
//! Stored in the target database under the `sw_meta` schema:
//!
//! - `sw_meta.schema_version`: one row per fully applied version;
//! - `sw_meta.task_log`: one row per committed task of the version in
//!   progress, cleared once that version is recorded.

use crate::error::{UpgradeError, UpgradeResult};
use crate::task::Task;
use chrono::NaiveDateTime;
use sw_core::Version;
use sw_db::{Database, DbError, SqlValue};

const JOURNAL_DDL: &str = "
CREATE SCHEMA IF NOT EXISTS sw_meta;
CREATE TABLE IF NOT EXISTS sw_meta.schema_version (
    version    VARCHAR PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS sw_meta.task_log (
    version      VARCHAR NOT NULL,
    task_index   INTEGER NOT NULL,
    label        VARCHAR NOT NULL,
    completed_at TIMESTAMP NOT NULL,
    PRIMARY KEY (version, task_index)
);
";

/// A committed task as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    pub index: usize,
    pub label: String,
}

/// Reads and writes the upgrade journal.
pub struct Journal<'a> {
    db: &'a dyn Database,
}

fn journal_err(action: &str, err: DbError) -> UpgradeError {
    UpgradeError::Journal(format!("failed to {action}: {err}"))
}

impl<'a> Journal<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Create the journal tables if they do not exist.
    pub async fn ensure(&self) -> UpgradeResult<()> {
        self.db
            .execute_batch(JOURNAL_DDL)
            .await
            .map_err(|e| journal_err("create journal tables", e))
    }

    /// Whether the journal tables are present. Reads treat a missing journal
    /// as empty so inspecting a database never creates them.
    pub async fn exists(&self) -> UpgradeResult<bool> {
        for table in ["sw_meta.schema_version", "sw_meta.task_log"] {
            let found = self
                .db
                .relation_exists(table)
                .await
                .map_err(|e| journal_err("look up journal tables", e))?;
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Highest applied version, or `None` on a fresh database.
    pub async fn installed_version(&self) -> UpgradeResult<Option<Version>> {
        if !self.exists().await? {
            return Ok(None);
        }
        let rows = self
            .db
            .query("SELECT version FROM sw_meta.schema_version", &[])
            .await
            .map_err(|e| journal_err("read installed versions", e))?;

        let mut highest: Option<Version> = None;
        for row in &rows {
            let Some(raw) = row.get_str(0) else { continue };
            let version = Version::parse(raw).map_err(|e| {
                UpgradeError::Journal(format!("unreadable version in journal: {e}"))
            })?;
            if highest.as_ref().map_or(true, |h| version > *h) {
                highest = Some(version);
            }
        }
        Ok(highest)
    }

    /// All applied versions with their timestamps, ascending.
    pub async fn history(&self) -> UpgradeResult<Vec<(Version, Option<NaiveDateTime>)>> {
        if !self.exists().await? {
            return Ok(Vec::new());
        }
        let rows = self
            .db
            .query("SELECT version, applied_at FROM sw_meta.schema_version", &[])
            .await
            .map_err(|e| journal_err("read version history", e))?;

        let mut history = rows
            .iter()
            .filter_map(|r| {
                let v = Version::parse(r.get_str(0)?).ok()?;
                Some((v, r.get_timestamp(1)))
            })
            .collect::<Vec<_>>();
        history.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(history)
    }

    /// Tasks of `version` committed so far, by index.
    pub async fn completed_tasks(&self, version: &Version) -> UpgradeResult<Vec<CompletedTask>> {
        if !self.exists().await? {
            return Ok(Vec::new());
        }
        let rows = self
            .db
            .query(
                "SELECT task_index, label FROM sw_meta.task_log WHERE version = ? ORDER BY task_index",
                &[version.as_str().into()],
            )
            .await
            .map_err(|e| journal_err("read task log", e))?;

        rows.iter()
            .map(|r| {
                let index = r
                    .get_i64(0)
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| UpgradeError::Journal("task log row without index".into()))?;
                Ok(CompletedTask {
                    index,
                    label: r.get_str(1).unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    /// Record that task `index` of `version` committed.
    pub async fn record_task(
        &self,
        version: &Version,
        index: usize,
        label: &str,
        at: NaiveDateTime,
    ) -> UpgradeResult<()> {
        let index = i64::try_from(index)
            .map_err(|_| UpgradeError::Journal(format!("task index {index} out of range")))?;
        self.db
            .execute_with_params(
                "INSERT OR REPLACE INTO sw_meta.task_log (version, task_index, label, completed_at) \
                 VALUES (?, ?, ?, ?)",
                &[
                    version.as_str().into(),
                    SqlValue::Integer(index),
                    label.into(),
                    at.into(),
                ],
            )
            .await
            .map_err(|e| journal_err("record task", e))?;
        Ok(())
    }

    /// Record `version` as applied and clear its task log.
    pub async fn record_version(&self, version: &Version, at: NaiveDateTime) -> UpgradeResult<()> {
        self.db
            .execute_with_params(
                "INSERT OR REPLACE INTO sw_meta.schema_version (version, applied_at) VALUES (?, ?)",
                &[version.as_str().into(), at.into()],
            )
            .await
            .map_err(|e| journal_err("record version", e))?;
        self.db
            .execute_with_params(
                "DELETE FROM sw_meta.task_log WHERE version = ?",
                &[version.as_str().into()],
            )
            .await
            .map_err(|e| journal_err("clear task log", e))?;
        Ok(())
    }

    /// Number of leading tasks of `tasks` already committed for `version`.
    ///
    /// Fails with `ResumeMismatch` when a recorded label no longer matches
    /// the task at the same position, or the log has gaps.
    pub async fn resume_point(&self, version: &Version, tasks: &[Task]) -> UpgradeResult<usize> {
        let completed = self.completed_tasks(version).await?;
        for (expected_index, done) in completed.iter().enumerate() {
            let expected = tasks
                .get(done.index)
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| "<no such task>".to_string());
            if done.index != expected_index || done.label != expected {
                return Err(UpgradeError::ResumeMismatch {
                    version: version.to_string(),
                    index: done.index,
                    recorded: done.label.clone(),
                    expected,
                });
            }
        }
        Ok(completed.len())
    }
}

#[cfg(test)]
#[path = "journal_test.rs"]
mod tests;
