//! Backfill of missing file upload dates.

use super::action_error;
use crate::context::UpgradeContext;
use crate::error::UpgradeResult;
use crate::task::UpgradeAction;
use async_trait::async_trait;
use sw_core::{ColumnName, TableName};
use sw_db::{Database, SqlValue};

/// Sets a NULL upload date to the creation time of the stored file.
///
/// The file is looked up as `<upload_dir>/<uri>`. Rows without a URI, or
/// whose file is gone, get the current time and a warning.
#[derive(Debug, Clone)]
pub struct BackfillUploadDate {
    table: TableName,
    id_column: ColumnName,
    uri_column: ColumnName,
    date_column: ColumnName,
}

impl BackfillUploadDate {
    /// Backfill `upload_date` of `table`, keyed by `id` with paths in `uri`.
    pub fn new(table: TableName) -> Self {
        Self {
            table,
            id_column: ColumnName::new("id"),
            uri_column: ColumnName::new("uri"),
            date_column: ColumnName::new("upload_date"),
        }
    }

    pub fn with_columns(mut self, id: ColumnName, uri: ColumnName, date: ColumnName) -> Self {
        self.id_column = id;
        self.uri_column = uri;
        self.date_column = date;
        self
    }
}

#[async_trait]
impl UpgradeAction for BackfillUploadDate {
    fn name(&self) -> &str {
        "backfill_upload_date"
    }

    async fn run(
        &self,
        ctx: &mut UpgradeContext,
        db: &dyn Database,
        _args: &[String],
    ) -> UpgradeResult<()> {
        let t = self.table.quoted();
        let id = self.id_column.quoted();
        let uri = self.uri_column.quoted();
        let date = self.date_column.quoted();

        let rows = db
            .query(
                &format!("SELECT {id}, {uri} FROM {t} WHERE {date} IS NULL ORDER BY {id}"),
                &[],
            )
            .await?;

        let update = format!("UPDATE {t} SET {date} = ? WHERE {id} = ?");
        for row in &rows {
            let row_id = row
                .get_i64(0)
                .ok_or_else(|| action_error(self.name(), format!("{t} has a row without an id")))?;

            let file_uri = row.get_str(1).filter(|u| !u.trim().is_empty());
            let path = match (file_uri, ctx.upload_dir()) {
                (Some(u), Some(dir)) => Some(dir.join(u)),
                _ => None,
            };
            let created = path.as_deref().and_then(|p| ctx.files().created(p));

            let stamp = match (created, file_uri) {
                (Some(ts), _) => ts,
                (None, None) => {
                    ctx.warn(format!(
                        "{} row {row_id} has no {}; using the current time",
                        self.table, self.uri_column
                    ));
                    ctx.now()
                }
                (None, Some(u)) => {
                    ctx.warn(format!(
                        "file '{u}' for {} row {row_id} not found; using the current time",
                        self.table
                    ));
                    ctx.now()
                }
            };

            db.execute_with_params(&update, &[SqlValue::from(stamp), SqlValue::from(row_id)])
                .await?;
        }

        log::info!("Set {} on {} row(s) of {}", self.date_column, rows.len(), self.table);
        Ok(())
    }
}

#[cfg(test)]
#[path = "backfill_test.rs"]
mod tests;
