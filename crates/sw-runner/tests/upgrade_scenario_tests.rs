//! End-to-end upgrade scenarios against in-memory DuckDB

use chrono::NaiveDate;
use std::sync::Arc;
use sw_core::{ColumnName, ColumnSpec, IndexName, InputType, SqlType, TableName, Version};
use sw_db::{DatabaseCore, DatabaseSchema, DuckDbBackend};
use sw_runner::actions::RepairUniqueIndex;
use sw_runner::{
    steps, Executor, RecordingProgress, StepRegistry, Task, TaskList, UpgradeContext, Upgrader,
};

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

/// Columns and indexes of every user table, in a stable order.
async fn schema_snapshot(db: &DuckDbBackend) -> Vec<String> {
    let columns = db
        .query(
            "SELECT table_name, column_name, data_type, is_nullable, COALESCE(column_default, '') \
             FROM information_schema.columns WHERE table_schema = 'main' \
             ORDER BY table_name, column_name",
            &[],
        )
        .await
        .unwrap();
    let indexes = db
        .query(
            "SELECT table_name, index_name, is_unique, sql FROM duckdb_indexes() \
             ORDER BY table_name, index_name",
            &[],
        )
        .await
        .unwrap();
    columns
        .iter()
        .chain(indexes.iter())
        .map(|r| format!("{:?}", r.0))
        .collect()
}

// ── 9.9.9: required column plus index repair ────────────────────────────

fn upgrade_9_9_9(_: &Version) -> Vec<Task> {
    let mut tasks = TaskList::new();
    tasks.alter_column(
        "Add required nick_name",
        TableName::new("crm_contact"),
        ColumnName::new("nick_name"),
        ColumnSpec::new("Nick Name", SqlType::Varchar(Some(64)), InputType::Text)
            .required(true)
            .default_value("x"),
    );
    tasks.custom_action(
        "Repair contact operation index",
        RepairUniqueIndex::new(
            TableName::new("crm_acl_contact_cache"),
            IndexName::new("UI_user_contact_operation"),
            vec![
                ColumnName::new("user_id"),
                ColumnName::new("contact_id"),
                ColumnName::new("operation"),
            ],
        ),
        &[],
    );
    tasks.into_tasks()
}

async fn legacy_contact_schema() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE crm_contact (id INTEGER, first_name VARCHAR);
         INSERT INTO crm_contact VALUES (1, 'Ada'), (2, 'Grace');
         CREATE TABLE crm_acl_contact_cache (user_id INTEGER, contact_id INTEGER, operation VARCHAR);",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_9_9_9_applies_both_changes() {
    let db = legacy_contact_schema().await;
    let registry = StepRegistry::builder()
        .function(v("9.9.9"), upgrade_9_9_9)
        .build()
        .unwrap();
    let tasks = registry.resolve(&v("9.9.9")).unwrap();
    let mut ctx = UpgradeContext::new();

    let summary = Executor::new(&db).run(&tasks, &mut ctx).await.unwrap();
    assert_eq!(summary.executed, 2);
    assert_eq!(summary.unchanged, 0);

    let column = db
        .column_info(&TableName::new("crm_contact"), &ColumnName::new("nick_name"))
        .await
        .unwrap()
        .expect("nick_name added");
    assert!(!column.nullable);

    let rows = db
        .query("SELECT COUNT(*) FROM crm_contact WHERE nick_name = 'x'", &[])
        .await
        .unwrap();
    assert_eq!(rows[0].get_i64(0), Some(2));

    let index = db
        .index_info(
            &TableName::new("crm_acl_contact_cache"),
            &IndexName::new("UI_user_contact_operation"),
        )
        .await
        .unwrap()
        .expect("index created");
    assert!(index.unique);
    assert_eq!(index.columns, vec!["user_id", "contact_id", "operation"]);
}

#[tokio::test]
async fn test_9_9_9_rerun_leaves_schema_unchanged() {
    let db = legacy_contact_schema().await;
    let registry = StepRegistry::builder()
        .function(v("9.9.9"), upgrade_9_9_9)
        .build()
        .unwrap();
    let tasks = registry.resolve(&v("9.9.9")).unwrap();
    let mut ctx = UpgradeContext::new();

    Executor::new(&db).run(&tasks, &mut ctx).await.unwrap();
    let after_first = schema_snapshot(&db).await;

    let summary = Executor::new(&db).run(&tasks, &mut ctx).await.unwrap();
    assert_eq!(summary.unchanged, 1);
    assert_eq!(schema_snapshot(&db).await, after_first);
}

#[tokio::test]
async fn test_9_9_9_through_upgrader_is_journaled() {
    let db = legacy_contact_schema().await;
    let registry = StepRegistry::builder()
        .function(v("9.9.9"), upgrade_9_9_9)
        .build()
        .unwrap();
    let upgrader = Upgrader::new(&registry, &db);
    let mut ctx = UpgradeContext::new();

    upgrader.run(&v("9.9.9"), &mut ctx).await.unwrap();
    let snapshot = schema_snapshot(&db).await;

    let again = upgrader.run(&v("9.9.9"), &mut ctx).await.unwrap();
    assert_eq!(again.executed, 0);
    assert_eq!(schema_snapshot(&db).await, snapshot);
    assert_eq!(
        upgrader.status().await.unwrap().installed,
        Some(v("9.9.9"))
    );
}

// ── 6.2.alpha1: built-in catalog on a CRM-shaped schema ─────────────────

async fn crm_6_1_schema() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE crm_managed (id INTEGER, module VARCHAR, name VARCHAR);
         CREATE TABLE crm_file (id INTEGER, mime_type VARCHAR, uri VARCHAR, upload_date TIMESTAMP);
         INSERT INTO crm_file VALUES
           (1, 'application/pdf', 'report.pdf', NULL),
           (2, 'image/png', 'lost.png', NULL),
           (3, 'text/plain', NULL, NULL);
         CREATE TABLE crm_custom_group (
           id INTEGER, name VARCHAR(64), extends VARCHAR(255), style VARCHAR(15)
         );
         INSERT INTO crm_custom_group VALUES
           (1, 'constituent', 'Individual', 'Tab'),
           (2, NULL, NULL, NULL);
         CREATE TABLE crm_acl_contact_cache (user_id INTEGER, contact_id INTEGER, operation VARCHAR);
         INSERT INTO crm_acl_contact_cache VALUES (1, 10, 'View'), (1, 11, 'Edit');
         CREATE UNIQUE INDEX UI_user_contact_operation
           ON crm_acl_contact_cache (user_id, contact_id, operation);",
    )
    .await
    .unwrap();
    db
}

/// 6.1 schema where the ACL cache also references its user through a foreign key.
async fn crm_6_1_schema_with_user_fk() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE crm_managed (id INTEGER, module VARCHAR, name VARCHAR);
         CREATE TABLE crm_file (id INTEGER, mime_type VARCHAR, uri VARCHAR, upload_date TIMESTAMP);
         INSERT INTO crm_file VALUES (1, 'text/plain', NULL, NULL);
         CREATE TABLE crm_custom_group (
           id INTEGER, name VARCHAR(64), extends VARCHAR(255), style VARCHAR(15)
         );
         INSERT INTO crm_custom_group VALUES (1, NULL, NULL, NULL);
         CREATE TABLE crm_contact (id INTEGER PRIMARY KEY, display_name VARCHAR);
         INSERT INTO crm_contact VALUES (1, 'Admin'), (10, 'Ada'), (11, 'Grace');
         CREATE TABLE crm_acl_contact_cache (
           user_id INTEGER REFERENCES crm_contact (id),
           contact_id INTEGER,
           operation VARCHAR
         );
         INSERT INTO crm_acl_contact_cache VALUES (1, 10, 'View'), (1, 11, 'Edit');
         CREATE UNIQUE INDEX UI_user_contact_operation
           ON crm_acl_contact_cache (user_id, contact_id, operation);",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_builtin_6_2_alpha1_upgrade() {
    let uploads = tempfile::tempdir().unwrap();
    std::fs::write(uploads.path().join("report.pdf"), b"%PDF").unwrap();
    let now = NaiveDate::from_ymd_opt(2031, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap();

    let db = crm_6_1_schema().await;
    let registry = steps::builtin().build().unwrap();
    let progress = RecordingProgress::new();
    let mut ctx = UpgradeContext::new()
        .with_upload_dir(uploads.path())
        .with_fixed_now(now)
        .with_progress(Arc::new(progress.clone()));

    let summary = Upgrader::new(&registry, &db)
        .run(&v("6.2.alpha1"), &mut ctx)
        .await
        .unwrap();
    assert_eq!(summary.executed, 9);
    assert_eq!(progress.finished_labels().len(), 9);

    // Two rows had no usable file on disk.
    assert_eq!(summary.warnings.len(), 2);

    let files = db
        .query("SELECT id, upload_date FROM crm_file ORDER BY id", &[])
        .await
        .unwrap();
    assert_ne!(files[0].get_timestamp(1), Some(now));
    assert_eq!(files[1].get_timestamp(1), Some(now));
    assert_eq!(files[2].get_timestamp(1), Some(now));

    let groups = db
        .query(
            "SELECT name, extends, style FROM crm_custom_group ORDER BY id",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(groups[0].get_str(0), Some("constituent"));
    assert_eq!(groups[0].get_str(2), Some("Tab"));
    assert_eq!(groups[1].get_str(0), Some("custom_group_2"));
    assert_eq!(groups[1].get_str(1), Some("Contact"));
    assert_eq!(groups[1].get_str(2), Some("Inline"));

    for column in ["name", "extends", "style"] {
        let info = db
            .column_info(&TableName::new("crm_custom_group"), &ColumnName::new(column))
            .await
            .unwrap()
            .unwrap();
        assert!(!info.nullable, "{column} should be NOT NULL");
    }

    let checksum = db
        .column_info(&TableName::new("crm_managed"), &ColumnName::new("checksum"))
        .await
        .unwrap()
        .unwrap();
    assert!(checksum.nullable);

    let domain = db
        .query(
            "SELECT COUNT(*) FROM crm_acl_contact_cache WHERE domain_id = 1",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(domain[0].get_i64(0), Some(2));

    let index = db
        .index_info(
            &TableName::new("crm_acl_contact_cache"),
            &IndexName::new("UI_user_contact_operation"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        index.columns,
        vec!["domain_id", "user_id", "contact_id", "operation"]
    );
}

#[tokio::test]
async fn test_6_2_alpha1_with_old_index_and_user_fk_then_rerun() {
    let db = crm_6_1_schema_with_user_fk().await;
    let registry = steps::builtin().build().unwrap();
    let mut ctx = UpgradeContext::new();

    let summary = Upgrader::new(&registry, &db)
        .run(&v("6.2.alpha1"), &mut ctx)
        .await
        .unwrap();
    assert_eq!(summary.executed, 9);
    assert!(summary
        .warnings
        .iter()
        .any(|w| w.message.contains("foreign key")));

    let acl = TableName::new("crm_acl_contact_cache");
    let domain = db
        .column_info(&acl, &ColumnName::new("domain_id"))
        .await
        .unwrap()
        .unwrap();
    assert!(!domain.nullable);
    assert!(db
        .foreign_key_exists(&acl, &ColumnName::new("user_id"))
        .await
        .unwrap());
    let index = db
        .index_info(&acl, &IndexName::new("UI_user_contact_operation"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        index.columns,
        vec!["domain_id", "user_id", "contact_id", "operation"]
    );

    // Replaying every task, not just trusting the journal, changes nothing.
    let before = schema_snapshot(&db).await;
    let tasks = registry.resolve(&v("6.2.alpha1")).unwrap();
    let rerun = Executor::new(&db)
        .run(&tasks, &mut UpgradeContext::new())
        .await
        .unwrap();
    assert_eq!(rerun.executed, 9);
    assert_eq!(rerun.unchanged, 6);
    assert_eq!(schema_snapshot(&db).await, before);
}
