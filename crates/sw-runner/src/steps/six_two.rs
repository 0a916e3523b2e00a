//! Upgrade steps for the 6.2 series.

use crate::actions::{BackfillUploadDate, RepairUniqueIndex};
use crate::queue::TaskList;
use crate::registry::{RegistryBuilder, StepDefinition};
use crate::task::{ScriptSource, Task};
use sw_core::{
    ColumnName, ColumnSpec, IndexName, InputType, OptionSource, SqlType, TableName, Version,
};

const ALPHA1_SQL: &str = include_str!("sql/6.2.alpha1.sql");

pub(super) fn register(builder: RegistryBuilder) -> RegistryBuilder {
    match Version::parse("6.2.alpha1") {
        Ok(v) => builder.step(
            StepDefinition::new(v)
                .function(upgrade_6_2_alpha1)
                .script(ScriptSource::embedded("6.2.alpha1.sql", ALPHA1_SQL)),
        ),
        Err(e) => {
            log::error!("Built-in step skipped: {e}");
            builder
        }
    }
}

fn since(spec: ColumnSpec, version: &str) -> ColumnSpec {
    match Version::parse(version) {
        Ok(v) => spec.added_in(v),
        Err(_) => spec,
    }
}

pub(super) fn upgrade_6_2_alpha1(rev: &Version) -> Vec<Task> {
    let custom_group = || TableName::new("crm_custom_group");
    let mut tasks = TaskList::new();

    tasks.run_sql(rev);
    tasks.alter_column(
        r#"Add column "crm_managed.checksum""#,
        TableName::new("crm_managed"),
        ColumnName::new("checksum"),
        ColumnSpec::new("Checksum", SqlType::Varchar(Some(45)), InputType::Text)
            .description("Configuration of the managed-entity when last stored"),
    );
    tasks.custom_action(
        "Set upload_date in file table",
        BackfillUploadDate::new(TableName::new("crm_file")),
        &[],
    );
    tasks.alter_column(
        "Set default for upload_date in file table",
        TableName::new("crm_file"),
        ColumnName::new("upload_date"),
        ColumnSpec::new("File Upload Date", SqlType::DateTime, InputType::SelectDate)
            .required(true)
            .readonly(true)
            .default_value("CURRENT_TIMESTAMP")
            .description("Date and time that this attachment was uploaded or written to server."),
    );
    tasks.alter_column(
        r#"CustomGroup: Make "name" required"#,
        custom_group(),
        ColumnName::new("name"),
        since(
            ColumnSpec::new("Custom Group Name", SqlType::Varchar(Some(64)), InputType::Text)
                .required(true)
                .description("Variable name/programmatic handle for this group."),
            "1.1",
        ),
    );
    tasks.alter_column(
        r#"CustomGroup: Make "extends" required"#,
        custom_group(),
        ColumnName::new("extends"),
        since(
            ColumnSpec::new("Custom Group Extends", SqlType::Varchar(Some(255)), InputType::Select)
                .required(true)
                .default_value("Contact")
                .options(OptionSource::callback("custom_group_extends_options"))
                .description("Type of object this group extends."),
            "1.1",
        ),
    );
    tasks.alter_column(
        r#"CustomGroup: Make "style" required"#,
        custom_group(),
        ColumnName::new("style"),
        since(
            ColumnSpec::new("Custom Group Style", SqlType::Varchar(Some(15)), InputType::Select)
                .required(true)
                .default_value("Inline")
                .options(OptionSource::callback("custom_group_style"))
                .description("Visual relationship between this form and its parent."),
            "1.1",
        ),
    );
    tasks.alter_column(
        "Add domain_id column to the ACL contact cache",
        TableName::new("crm_acl_contact_cache"),
        ColumnName::new("domain_id"),
        ColumnSpec::new("Domain", SqlType::Int { unsigned: true }, InputType::Number)
            .required(true)
            .default_value("1")
            .description("Implicit FK to crm_domain"),
    );
    tasks.custom_action(
        "Fix unique index on ACL contact cache with domain id",
        RepairUniqueIndex::new(
            TableName::new("crm_acl_contact_cache"),
            IndexName::new("UI_user_contact_operation"),
            ["domain_id", "user_id", "contact_id", "operation"]
                .into_iter()
                .map(ColumnName::new)
                .collect(),
        )
        .dropping_foreign_key(ColumnName::new("user_id")),
        &[],
    );

    tasks.into_tasks()
}
