use super::*;
use crate::queue::TaskList;
use crate::task::ScriptSource;
use chrono::NaiveDate;
use sw_db::{DatabaseCore, DuckDbBackend};

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

fn three_tasks() -> Vec<Task> {
    let mut list = TaskList::new();
    for label in ["one", "two", "three"] {
        list.run_script(label, ScriptSource::embedded(label, "SELECT 1"));
    }
    list.into_tasks()
}

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let db = DuckDbBackend::in_memory().unwrap();
    let journal = Journal::new(&db);
    journal.ensure().await.unwrap();
    journal.ensure().await.unwrap();

    assert!(db.relation_exists("sw_meta.schema_version").await.unwrap());
    assert!(db.relation_exists("sw_meta.task_log").await.unwrap());
    assert_eq!(journal.installed_version().await.unwrap(), None);
}

#[tokio::test]
async fn test_installed_version_uses_version_order() {
    let db = DuckDbBackend::in_memory().unwrap();
    let journal = Journal::new(&db);
    journal.ensure().await.unwrap();

    journal.record_version(&v("6.10.0"), at(3)).await.unwrap();
    journal.record_version(&v("6.2.alpha1"), at(1)).await.unwrap();
    journal.record_version(&v("6.9.1"), at(2)).await.unwrap();

    assert_eq!(journal.installed_version().await.unwrap(), Some(v("6.10.0")));

    let history: Vec<String> = journal
        .history()
        .await
        .unwrap()
        .into_iter()
        .map(|(v, _)| v.to_string())
        .collect();
    assert_eq!(history, vec!["6.2.alpha1", "6.9.1", "6.10.0"]);
}

#[tokio::test]
async fn test_resume_point_counts_committed_tasks() {
    let db = DuckDbBackend::in_memory().unwrap();
    let journal = Journal::new(&db);
    journal.ensure().await.unwrap();
    let tasks = three_tasks();
    let version = v("9.9.9");

    assert_eq!(journal.resume_point(&version, &tasks).await.unwrap(), 0);

    journal.record_task(&version, 0, "one", at(1)).await.unwrap();
    journal.record_task(&version, 1, "two", at(1)).await.unwrap();
    assert_eq!(journal.resume_point(&version, &tasks).await.unwrap(), 2);

    let done = journal.completed_tasks(&version).await.unwrap();
    assert_eq!(
        done,
        vec![
            CompletedTask {
                index: 0,
                label: "one".into()
            },
            CompletedTask {
                index: 1,
                label: "two".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_resume_point_detects_label_mismatch() {
    let db = DuckDbBackend::in_memory().unwrap();
    let journal = Journal::new(&db);
    journal.ensure().await.unwrap();
    let version = v("9.9.9");

    journal.record_task(&version, 0, "one", at(1)).await.unwrap();
    journal
        .record_task(&version, 1, "renamed", at(1))
        .await
        .unwrap();

    let err = journal
        .resume_point(&version, &three_tasks())
        .await
        .unwrap_err();
    match err {
        UpgradeError::ResumeMismatch {
            index,
            recorded,
            expected,
            ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(recorded, "renamed");
            assert_eq!(expected, "two");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_record_version_clears_task_log() {
    let db = DuckDbBackend::in_memory().unwrap();
    let journal = Journal::new(&db);
    journal.ensure().await.unwrap();
    let version = v("9.9.9");

    journal.record_task(&version, 0, "one", at(1)).await.unwrap();
    journal.record_version(&version, at(2)).await.unwrap();

    assert!(journal.completed_tasks(&version).await.unwrap().is_empty());
    assert_eq!(journal.installed_version().await.unwrap(), Some(version));
}

#[tokio::test]
async fn test_journal_missing_tables_is_journal_error() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = Journal::new(&db).installed_version().await.unwrap_err();
    assert!(matches!(err, UpgradeError::Journal(_)));
}
