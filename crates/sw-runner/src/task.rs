//! Atomic upgrade tasks.

use crate::context::UpgradeContext;
use crate::error::UpgradeResult;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use sw_core::{ColumnName, ColumnSpec, TableName, Version};
use sw_db::Database;

/// Where a script task's SQL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Template text compiled into the binary
    Embedded { name: String, sql: String },
    /// Template file read when the task runs
    File(PathBuf),
    /// The script registered for a version; replaced by the registry when
    /// the task list is resolved
    Step(Version),
}

impl ScriptSource {
    pub fn embedded(name: impl Into<String>, sql: impl Into<String>) -> Self {
        ScriptSource::Embedded {
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> String {
        match self {
            ScriptSource::Embedded { name, .. } => name.clone(),
            ScriptSource::File(path) => path.display().to_string(),
            ScriptSource::Step(version) => format!("<script for {version}>"),
        }
    }

    /// Whether a file template uses the `.j2` suffix.
    pub fn is_template_file(&self) -> bool {
        matches!(self, ScriptSource::File(p) if p.extension().is_some_and(|e| e == "j2"))
    }
}

/// Custom logic run as a single task.
#[async_trait]
pub trait UpgradeAction: Send + Sync {
    /// Stable name, used in logs and errors
    fn name(&self) -> &str;

    async fn run(
        &self,
        ctx: &mut UpgradeContext,
        db: &dyn Database,
        args: &[String],
    ) -> UpgradeResult<()>;
}

/// One step of an upgrade.
#[derive(Clone)]
pub enum Task {
    RunScript {
        label: String,
        script: ScriptSource,
    },
    AlterColumn {
        label: String,
        table: TableName,
        column: ColumnName,
        spec: ColumnSpec,
    },
    CustomAction {
        label: String,
        action: Arc<dyn UpgradeAction>,
        args: Vec<String>,
    },
}

impl Task {
    pub fn label(&self) -> &str {
        match self {
            Task::RunScript { label, .. }
            | Task::AlterColumn { label, .. }
            | Task::CustomAction { label, .. } => label,
        }
    }

    /// Short kind name for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Task::RunScript { .. } => "sql",
            Task::AlterColumn { .. } => "alter",
            Task::CustomAction { .. } => "action",
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Task::RunScript { .. })
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::RunScript { label, script } => f
                .debug_struct("RunScript")
                .field("label", label)
                .field("script", &script.name())
                .finish(),
            Task::AlterColumn {
                label,
                table,
                column,
                spec,
            } => f
                .debug_struct("AlterColumn")
                .field("label", label)
                .field("table", table)
                .field("column", column)
                .field("spec", spec)
                .finish(),
            Task::CustomAction {
                label,
                action,
                args,
            } => f
                .debug_struct("CustomAction")
                .field("label", label)
                .field("action", &action.name())
                .field("args", args)
                .finish(),
        }
    }
}
