//! sw-db - Database abstraction layer for Stepwise
//!
//! This crate provides the traits the upgrade runner executes against
//! (`DatabaseCore` for SQL, `DatabaseSchema` for catalog introspection) and a
//! DuckDB implementation of both.

pub mod duckdb;
pub mod error;
pub mod traits;
pub mod value;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{ColumnInfo, Database, DatabaseCore, DatabaseSchema, IndexInfo};
pub use value::{ParamType, Row, SqlValue};
