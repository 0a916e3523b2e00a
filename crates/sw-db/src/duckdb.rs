//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ColumnInfo, DatabaseCore, DatabaseSchema, IndexInfo};
use crate::value::{Row, SqlValue};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use sw_core::sql_utils::{quote_ident, split_qualified_name};
use sw_core::{ColumnName, IndexName, TableName};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn execute_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        log::debug!("duckdb execute: {sql}");
        let conn = self.lock()?;
        conn.execute(sql, params_from_iter(params.iter()))
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        log::debug!("duckdb execute_batch ({} bytes)", sql.len());
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn query_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        // Column metadata is only valid after execution, so count per row.
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let col_count = row.as_ref().column_count();
                (0..col_count)
                    .map(|i| row.get::<_, Value>(i).map(SqlValue::from))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Row)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn schema_and_table(table: &TableName) -> (String, String) {
        let (schema, name) = table.parts();
        (schema.to_string(), name.to_string())
    }
}

/// `index_name, is_unique, sql` row from `duckdb_indexes()`.
fn index_from_row(row: &Row) -> DbResult<IndexInfo> {
    let name = row.get_str(0).unwrap_or_default().to_string();
    let sql = row.get_str(2).map(str::to_string);
    let columns = sql
        .as_deref()
        .and_then(parse_index_columns)
        .ok_or_else(|| DbError::IntrospectionError(format!("cannot read columns of index {name}")))?;
    Ok(IndexInfo {
        name,
        unique: row.get(1).and_then(SqlValue::as_bool).unwrap_or(false),
        columns,
        sql,
    })
}

/// Extract the key columns from a `CREATE [UNIQUE] INDEX ... ON t (a, b)` statement.
pub(crate) fn parse_index_columns(sql: &str) -> Option<Vec<String>> {
    let upper = sql.to_ascii_uppercase();
    let on = upper.find(" ON ")?;
    let open = on + sql[on..].find('(')?;
    let close = sql.rfind(')')?;
    if close <= open {
        return None;
    }
    let columns: Vec<String> = sql[open + 1..close]
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect();
    (!columns.is_empty()).then_some(columns)
}

/// Extract the local columns from a `FOREIGN KEY (a, b) REFERENCES ...` constraint.
pub(crate) fn parse_foreign_key_columns(constraint_text: &str) -> Vec<String> {
    let upper = constraint_text.to_ascii_uppercase();
    let Some(fk) = upper.find("FOREIGN KEY") else {
        return Vec::new();
    };
    let rest = &constraint_text[fk..];
    let (Some(open), Some(close)) = (rest.find('('), rest.find(')')) else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    rest[open + 1..close]
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

#[async_trait]
impl DatabaseCore for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql, &[])
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.execute_sync(sql, params)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        self.query_sync(sql, params)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(name);
        let rows = self.query_sync(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            &[schema.into(), table.into()],
        )?;
        Ok(rows.first().and_then(|r| r.get_i64(0)).unwrap_or(0) > 0)
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        self.execute_sync(&sql, &[])?;
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[async_trait]
impl DatabaseSchema for DuckDbBackend {
    async fn column_info(
        &self,
        table: &TableName,
        column: &ColumnName,
    ) -> DbResult<Option<ColumnInfo>> {
        let (schema, name) = Self::schema_and_table(table);
        let rows = self.query_sync(
            "SELECT data_type, is_nullable, column_default FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? AND column_name = ?",
            &[schema.into(), name.into(), column.as_str().into()],
        )?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let data_type = row.get_str(0).ok_or_else(|| {
            DbError::IntrospectionError(format!("no data_type reported for {table}.{column}"))
        })?;
        let nullable = !matches!(row.get_str(1), Some(v) if v.eq_ignore_ascii_case("NO"));
        Ok(Some(ColumnInfo {
            data_type: data_type.to_string(),
            nullable,
            default: row.get_str(2).map(String::from),
        }))
    }

    async fn index_info(
        &self,
        table: &TableName,
        index: &IndexName,
    ) -> DbResult<Option<IndexInfo>> {
        let (schema, name) = Self::schema_and_table(table);
        let rows = self.query_sync(
            "SELECT index_name, is_unique, sql FROM duckdb_indexes() \
             WHERE schema_name = ? AND table_name = ? AND lower(index_name) = lower(?)",
            &[schema.into(), name.into(), index.as_str().into()],
        )?;
        rows.first().map(index_from_row).transpose()
    }

    async fn table_indexes(&self, table: &TableName) -> DbResult<Vec<IndexInfo>> {
        let (schema, name) = Self::schema_and_table(table);
        let rows = self.query_sync(
            "SELECT index_name, is_unique, sql FROM duckdb_indexes() \
             WHERE schema_name = ? AND table_name = ? ORDER BY index_oid",
            &[schema.into(), name.into()],
        )?;
        rows.iter().map(index_from_row).collect()
    }

    async fn foreign_key_exists(&self, table: &TableName, column: &ColumnName) -> DbResult<bool> {
        let (schema, name) = Self::schema_and_table(table);
        let rows = self.query_sync(
            "SELECT constraint_text FROM duckdb_constraints() \
             WHERE schema_name = ? AND table_name = ? AND constraint_type = 'FOREIGN KEY'",
            &[schema.into(), name.into()],
        )?;
        Ok(rows.iter().filter_map(|r| r.get_str(0)).any(|text| {
            parse_foreign_key_columns(text)
                .iter()
                .any(|c| c.eq_ignore_ascii_case(column.as_str()))
        }))
    }

    async fn drop_foreign_key(&self, table: &TableName, column: &ColumnName) -> DbResult<()> {
        // DuckDB has no ALTER TABLE ... DROP CONSTRAINT.
        Err(DbError::NotImplemented {
            backend: "duckdb".to_string(),
            feature: format!("dropping the foreign key on {table}.{column}"),
        })
    }

    async fn drop_index_if_exists(&self, table: &TableName, index: &IndexName) -> DbResult<bool> {
        let Some(existing) = self.index_info(table, index).await? else {
            return Ok(false);
        };
        let (schema, _) = table.parts();
        let sql = if schema == "main" {
            format!("DROP INDEX IF EXISTS {}", quote_ident(&existing.name))
        } else {
            format!(
                "DROP INDEX IF EXISTS {}.{}",
                quote_ident(schema),
                quote_ident(&existing.name)
            )
        };
        self.execute_sync(&sql, &[])?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
