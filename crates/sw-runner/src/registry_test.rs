use super::*;
use crate::queue::TaskList;
use sw_core::{ColumnName, ColumnSpec, InputType, SqlType, TableName};

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn embedded(name: &str) -> ScriptSource {
    ScriptSource::embedded(name, "SELECT 1;")
}

fn labels(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(Task::label).collect()
}

fn ordered_step(version: &Version) -> Vec<Task> {
    let spec = ColumnSpec::new("Checksum", SqlType::Varchar(Some(45)), InputType::Text);
    let mut tasks = TaskList::new();
    tasks
        .run_sql(version)
        .alter_column(
            "Add checksum",
            TableName::new("crm_managed"),
            ColumnName::new("checksum"),
            spec,
        )
        .run_script("Extra cleanup", ScriptSource::embedded("cleanup", "SELECT 2;"));
    tasks.into_tasks()
}

fn forgets_script(_: &Version) -> Vec<Task> {
    let mut tasks = TaskList::new();
    tasks.run_script("Only this", ScriptSource::embedded("other", "SELECT 3;"));
    tasks.into_tasks()
}

fn no_tasks(_: &Version) -> Vec<Task> {
    Vec::new()
}

fn invalid_spec(_: &Version) -> Vec<Task> {
    // Select input without an option source.
    let spec = ColumnSpec::new("Extends", SqlType::Varchar(Some(255)), InputType::Select);
    let mut tasks = TaskList::new();
    tasks.alter_column(
        "Make extends required",
        TableName::new("crm_custom_group"),
        ColumnName::new("extends"),
        spec,
    );
    tasks.into_tasks()
}

fn queues_missing_script(version: &Version) -> Vec<Task> {
    let mut tasks = TaskList::new();
    tasks.run_sql(version);
    tasks.into_tasks()
}

#[test]
fn test_resolve_keeps_function_order_and_resolves_script() {
    let version = v("6.2.alpha1");
    let registry = StepRegistry::builder()
        .function(version.clone(), ordered_step)
        .script(version.clone(), embedded("6.2.alpha1.sql"))
        .build()
        .unwrap();

    let tasks = registry.resolve(&version).unwrap();
    assert_eq!(
        labels(&tasks),
        vec!["Upgrade DB to 6.2.alpha1: SQL", "Add checksum", "Extra cleanup"]
    );
    match &tasks[0] {
        Task::RunScript { script, .. } => assert_eq!(script.name(), "6.2.alpha1.sql"),
        other => panic!("unexpected task {other:?}"),
    }
    assert!(!registry.step(&version).unwrap().skips_script());
}

#[test]
fn test_script_only_step_synthesizes_single_task() {
    let registry = StepRegistry::builder()
        .script(v("6.1.0"), embedded("6.1.0.sql"))
        .build()
        .unwrap();

    let tasks = registry.resolve(&v("6.1.0")).unwrap();
    assert_eq!(labels(&tasks), vec!["Upgrade DB to 6.1.0: SQL"]);
    assert!(registry.step(&v("6.1.0")).unwrap().is_script_only());
}

#[test]
fn test_function_without_script_task_skips_script() {
    let registry = StepRegistry::builder()
        .function(v("6.3.0"), forgets_script)
        .script(v("6.3.0"), embedded("6.3.0.sql"))
        .build()
        .unwrap();

    let step = registry.step(&v("6.3.0")).unwrap();
    assert!(step.skips_script());
    assert_eq!(labels(&registry.resolve(&v("6.3.0")).unwrap()), vec!["Only this"]);
}

#[test]
fn test_empty_step_is_legal() {
    let registry = StepRegistry::builder()
        .function(v("6.4.0"), no_tasks)
        .build()
        .unwrap();
    assert!(registry.resolve(&v("6.4.0")).unwrap().is_empty());
}

#[test]
fn test_duplicate_version_rejected() {
    let err = StepRegistry::builder()
        .function(v("6.2.0"), no_tasks)
        .function(v("6.2.0"), no_tasks)
        .build()
        .unwrap_err();
    assert!(matches!(err, UpgradeError::Registration { ref version, .. } if version == "6.2.0"));
}

#[test]
fn test_duplicate_script_rejected() {
    let err = StepRegistry::builder()
        .script(v("6.2.0"), embedded("a"))
        .script(v("6.2.0"), embedded("b"))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("two scripts"));
}

#[test]
fn test_step_without_function_or_script_rejected() {
    let err = StepRegistry::builder()
        .step(StepDefinition::new(v("6.2.0")))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("neither"));
}

#[test]
fn test_invalid_spec_rejected_at_build() {
    let err = StepRegistry::builder()
        .function(v("6.2.0"), invalid_spec)
        .build()
        .unwrap_err();
    assert!(
        matches!(err, UpgradeError::SpecValidation { ref table, ref column, .. }
            if table == "crm_custom_group" && column == "extends")
    );
}

#[test]
fn test_queued_script_must_exist() {
    let err = StepRegistry::builder()
        .function(v("6.2.0"), queues_missing_script)
        .build()
        .unwrap_err();
    assert!(matches!(err, UpgradeError::Registration { .. }));
}

#[test]
fn test_resolve_unknown_version() {
    let registry = StepRegistry::builder().build().unwrap();
    assert!(registry.is_empty());
    let err = registry.resolve(&v("1.0")).unwrap_err();
    assert!(matches!(err, UpgradeError::NotFound { .. }));
}

#[test]
fn test_version_queries() {
    let registry = StepRegistry::builder()
        .function(v("6.10.0"), no_tasks)
        .function(v("6.2.alpha1"), no_tasks)
        .function(v("6.2.0"), no_tasks)
        .function(v("6.2.beta1"), no_tasks)
        .build()
        .unwrap();

    let all: Vec<String> = registry.versions().iter().map(|v| v.to_string()).collect();
    assert_eq!(all, vec!["6.2.alpha1", "6.2.beta1", "6.2.0", "6.10.0"]);
    assert_eq!(registry.latest(), Some(&v("6.10.0")));
    assert!(registry.contains(&v("6.2.beta1")));
    assert!(!registry.contains(&v("6.2.rc1")));

    let pending: Vec<String> = registry
        .between(Some(&v("6.2.alpha1")), &v("6.2.0"))
        .iter()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(pending, vec!["6.2.beta1", "6.2.0"]);
    assert_eq!(registry.between(None, &v("6.2.alpha1")).len(), 1);
    assert!(registry.between(Some(&v("6.10.0")), &v("6.10.0")).is_empty());
}

#[test]
fn test_messages_kept_on_step() {
    let registry = StepRegistry::builder()
        .step(
            StepDefinition::new(v("7.0.0"))
                .function(no_tasks)
                .pre_message("Back up first")
                .post_message("Rebuild caches"),
        )
        .build()
        .unwrap();
    let step = registry.step(&v("7.0.0")).unwrap();
    assert_eq!(step.pre_upgrade_message(), Some("Back up first"));
    assert_eq!(step.post_upgrade_message(), Some("Rebuild caches"));
}
