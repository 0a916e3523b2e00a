//! Builder step functions use to produce their task list.

use crate::task::{ScriptSource, Task, UpgradeAction};
use std::sync::Arc;
use sw_core::{ColumnName, ColumnSpec, TableName, Version};

/// Label given to a version's own SQL script task.
pub fn script_label(version: &Version) -> String {
    format!("Upgrade DB to {version}: SQL")
}

/// Ordered, append-only list of tasks.
///
/// Tasks come out of [`into_tasks`](Self::into_tasks) in exactly the order
/// they were added; nothing is reordered or deduplicated.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script registered for `version`.
    pub fn run_sql(&mut self, version: &Version) -> &mut Self {
        self.run_script(script_label(version), ScriptSource::Step(version.clone()))
    }

    pub fn run_script(&mut self, label: impl Into<String>, script: ScriptSource) -> &mut Self {
        self.tasks.push(Task::RunScript {
            label: label.into(),
            script,
        });
        self
    }

    pub fn alter_column(
        &mut self,
        label: impl Into<String>,
        table: TableName,
        column: ColumnName,
        spec: ColumnSpec,
    ) -> &mut Self {
        self.tasks.push(Task::AlterColumn {
            label: label.into(),
            table,
            column,
            spec,
        });
        self
    }

    pub fn custom_action<A>(&mut self, label: impl Into<String>, action: A, args: &[&str]) -> &mut Self
    where
        A: UpgradeAction + 'static,
    {
        self.tasks.push(Task::CustomAction {
            label: label.into(),
            action: Arc::new(action),
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }
}
