//! Idempotent column alteration.
//!
//! The current column is introspected first and only the differences from
//! the target [`ColumnSpec`] are turned into statements. A column that
//! already matches produces no statements at all.

use crate::error::{UpgradeError, UpgradeResult};
use sw_core::{ColumnName, ColumnSpec, IndexName, TableName};
use sw_db::{ColumnInfo, Database, DbError};

/// What an alter-column task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOutcome {
    /// Column was missing and has been added
    Added { statements: Vec<String> },
    /// Column existed and some attributes were changed
    Modified { statements: Vec<String> },
    /// Column already matched; nothing was executed
    Unchanged,
}

impl AlterOutcome {
    pub fn statements(&self) -> &[String] {
        match self {
            AlterOutcome::Added { statements } | AlterOutcome::Modified { statements } => {
                statements
            }
            AlterOutcome::Unchanged => &[],
        }
    }
}

/// Statements that bring `current` in line with `spec`.
///
/// Order matters for required columns: the default is set and NULL rows are
/// backfilled before `SET NOT NULL`.
pub fn plan_alter(
    table: &TableName,
    column: &ColumnName,
    spec: &ColumnSpec,
    current: Option<&ColumnInfo>,
) -> Vec<String> {
    let t = table.quoted();
    let c = column.quoted();
    let default = spec.default_sql();
    let mut stmts = Vec::new();

    let backfill = |stmts: &mut Vec<String>| {
        if let Some(d) = &default {
            stmts.push(format!("UPDATE {t} SET {c} = {d} WHERE {c} IS NULL"));
        }
    };

    let Some(current) = current else {
        let mut add = format!("ALTER TABLE {t} ADD COLUMN {c} {}", spec.sql_type.ddl());
        if let Some(d) = &default {
            add.push_str(&format!(" DEFAULT {d}"));
        }
        stmts.push(add);
        if spec.required {
            backfill(&mut stmts);
            stmts.push(format!("ALTER TABLE {t} ALTER COLUMN {c} SET NOT NULL"));
        }
        return stmts;
    };

    if !spec.sql_type.matches_catalog(&current.data_type) {
        stmts.push(format!(
            "ALTER TABLE {t} ALTER COLUMN {c} TYPE {}",
            spec.sql_type.ddl()
        ));
    }

    if !spec.default_matches(current.default.as_deref()) {
        match &default {
            Some(d) => stmts.push(format!("ALTER TABLE {t} ALTER COLUMN {c} SET DEFAULT {d}")),
            None => stmts.push(format!("ALTER TABLE {t} ALTER COLUMN {c} DROP DEFAULT")),
        }
    }

    if spec.required && current.nullable {
        backfill(&mut stmts);
        stmts.push(format!("ALTER TABLE {t} ALTER COLUMN {c} SET NOT NULL"));
    } else if !spec.required && !current.nullable {
        stmts.push(format!("ALTER TABLE {t} ALTER COLUMN {c} DROP NOT NULL"));
    }

    stmts
}

/// Bring `table.column` in line with `spec`.
pub async fn apply_alter(
    db: &dyn Database,
    table: &TableName,
    column: &ColumnName,
    spec: &ColumnSpec,
) -> UpgradeResult<AlterOutcome> {
    spec.check(table, column)
        .map_err(UpgradeError::from_spec_check)?;

    if !db.relation_exists(table).await? {
        return Err(DbError::TableNotFound(table.to_string()).into());
    }

    let current = db.column_info(table, column).await?;
    let statements = plan_alter(table, column, spec, current.as_ref());
    if statements.is_empty() {
        log::debug!("{table}.{column} already matches its spec");
        return Ok(AlterOutcome::Unchanged);
    }

    execute_statements(db, table, &statements).await?;

    Ok(if current.is_none() {
        AlterOutcome::Added { statements }
    } else {
        AlterOutcome::Modified { statements }
    })
}

/// Run `statements` in order. A statement the backend refuses because
/// indexes depend on the table is retried, along with everything after it,
/// with those indexes dropped; they are recreated afterwards.
async fn execute_statements(
    db: &dyn Database,
    table: &TableName,
    statements: &[String],
) -> UpgradeResult<()> {
    for (i, sql) in statements.iter().enumerate() {
        match db.execute(sql).await {
            Ok(_) => {}
            Err(DbError::AlterBlocked(msg)) => {
                log::debug!("{msg}");
                return execute_without_indexes(db, table, &statements[i..]).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn execute_without_indexes(
    db: &dyn Database,
    table: &TableName,
    statements: &[String],
) -> UpgradeResult<()> {
    let indexes = db.table_indexes(table).await?;
    let mut detached = Vec::with_capacity(indexes.len());
    for index in indexes {
        let unusable = || {
            DbError::IntrospectionError(format!(
                "index {} on {table} cannot be dropped and recreated",
                index.name
            ))
        };
        let name = IndexName::try_new(index.name.clone()).ok_or_else(unusable)?;
        let sql = index.sql.clone().ok_or_else(unusable)?;
        detached.push((name, sql));
    }

    log::info!(
        "Rebuilding {} index(es) on {table} around its column change",
        detached.len()
    );
    for (name, _) in &detached {
        db.drop_index_if_exists(table, name).await?;
    }

    let mut altered = Ok(());
    for sql in statements {
        if let Err(e) = db.execute(sql).await {
            altered = Err(e);
            break;
        }
    }

    // recreate even when the alter failed so the table keeps its indexes
    let mut restored = Ok(());
    for (_, sql) in &detached {
        if let Err(e) = db.execute_batch(sql).await {
            log::error!("Could not recreate index on {table}: {e}");
            if restored.is_ok() {
                restored = Err(e);
            }
        }
    }

    altered?;
    restored?;
    Ok(())
}

#[cfg(test)]
#[path = "alter_test.rs"]
mod tests;
