//! Rebuild of a unique index, clearing what stands in its way first.

use super::action_error;
use crate::context::UpgradeContext;
use crate::error::UpgradeResult;
use crate::task::UpgradeAction;
use async_trait::async_trait;
use sw_core::{ColumnName, IndexName, TableName};
use sw_db::{Database, DbError};

/// Drops a foreign key (if present) and the named index (if present), then
/// creates the unique index over `columns`.
///
/// Every step tolerates the state a previous partial run left behind, so the
/// action can be re-run until it succeeds.
#[derive(Debug, Clone)]
pub struct RepairUniqueIndex {
    table: TableName,
    index: IndexName,
    columns: Vec<ColumnName>,
    foreign_key_column: Option<ColumnName>,
}

impl RepairUniqueIndex {
    pub fn new(table: TableName, index: IndexName, columns: Vec<ColumnName>) -> Self {
        Self {
            table,
            index,
            columns,
            foreign_key_column: None,
        }
    }

    /// Also drop the foreign key declared on `column` before rebuilding.
    pub fn dropping_foreign_key(mut self, column: ColumnName) -> Self {
        self.foreign_key_column = Some(column);
        self
    }

    fn create_sql(&self) -> String {
        let cols: Vec<String> = self.columns.iter().map(|c| c.quoted()).collect();
        format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            self.index.quoted(),
            self.table.quoted(),
            cols.join(", ")
        )
    }
}

#[async_trait]
impl UpgradeAction for RepairUniqueIndex {
    fn name(&self) -> &str {
        "repair_unique_index"
    }

    async fn run(
        &self,
        ctx: &mut UpgradeContext,
        db: &dyn Database,
        _args: &[String],
    ) -> UpgradeResult<()> {
        if self.columns.is_empty() {
            return Err(action_error(self.name(), "no index columns given"));
        }

        if let Some(fk) = &self.foreign_key_column {
            if db.foreign_key_exists(&self.table, fk).await? {
                match db.drop_foreign_key(&self.table, fk).await {
                    Ok(()) => log::info!("Dropped foreign key on {}.{fk}", self.table),
                    Err(DbError::NotImplemented { backend, .. }) => ctx.warn(format!(
                        "foreign key on {}.{fk} cannot be dropped on {backend}; left in place",
                        self.table
                    )),
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if db.drop_index_if_exists(&self.table, &self.index).await? {
            log::debug!("Dropped index {} on {}", self.index, self.table);
        }

        db.execute(&self.create_sql()).await?;
        log::info!(
            "Created unique index {} on {} ({})",
            self.index,
            self.table,
            self.columns
                .iter()
                .map(ColumnName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
