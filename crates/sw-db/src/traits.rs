//! Database trait definitions
//!
//! The upgrade runner talks to the database through two narrow traits:
//! [`DatabaseCore`] executes SQL, [`DatabaseSchema`] answers catalog
//! questions so schema changes can check the current state before mutating.
//! [`Database`] is the union both are implemented for.

use crate::error::DbResult;
use crate::value::{Row, SqlValue};
use async_trait::async_trait;
use sw_core::{ColumnName, IndexName, TableName};

/// SQL execution
#[async_trait]
pub trait DatabaseCore: Send + Sync {
    /// Execute a single statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple statements separated by `;`
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with positional `?` bindings
    async fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Run a query with positional `?` bindings and collect every row
    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Current catalog state of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Catalog type name, e.g. `VARCHAR` or `UINTEGER`
    pub data_type: String,
    pub nullable: bool,
    /// Default expression as the catalog spells it
    pub default: Option<String>,
}

/// Current catalog state of one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    /// Indexed columns in key order
    pub columns: Vec<String>,
    /// `CREATE INDEX` statement that recreates the index, when the catalog keeps it
    pub sql: Option<String>,
}

impl IndexInfo {
    /// Whether this index is unique over exactly `columns`, in order.
    pub fn matches(&self, unique: bool, columns: &[ColumnName]) -> bool {
        self.unique == unique
            && self.columns.len() == columns.len()
            && self
                .columns
                .iter()
                .zip(columns)
                .all(|(have, want)| have.eq_ignore_ascii_case(want.as_str()))
    }
}

/// Catalog introspection and the guarded drops built on it
#[async_trait]
pub trait DatabaseSchema: Send + Sync {
    /// Look up a column; `None` if the table has no such column
    async fn column_info(
        &self,
        table: &TableName,
        column: &ColumnName,
    ) -> DbResult<Option<ColumnInfo>>;

    /// Look up an index on `table` by name
    async fn index_info(&self, table: &TableName, index: &IndexName)
        -> DbResult<Option<IndexInfo>>;

    /// Every index on `table`, in catalog order
    async fn table_indexes(&self, table: &TableName) -> DbResult<Vec<IndexInfo>>;

    /// Whether `table` has a foreign key constraint on `column`
    async fn foreign_key_exists(&self, table: &TableName, column: &ColumnName) -> DbResult<bool>;

    /// Drop the foreign key constraint on `table.column`
    async fn drop_foreign_key(&self, table: &TableName, column: &ColumnName) -> DbResult<()>;

    /// Drop an index if present; returns whether anything was dropped
    async fn drop_index_if_exists(&self, table: &TableName, index: &IndexName) -> DbResult<bool>;
}

/// A database the upgrade runner can execute against.
pub trait Database: DatabaseCore + DatabaseSchema {}

impl<T: DatabaseCore + DatabaseSchema> Database for T {}
