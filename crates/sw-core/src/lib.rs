//! sw-core - Core library for Stepwise
//!
//! This crate provides the shared types used by every Stepwise component:
//! dotted upgrade versions, declarative column specifications, identifier
//! newtypes, SQL quoting helpers, and `stepwise.yml` configuration.

pub mod checksum;
pub mod column_spec;
pub mod config;
pub mod error;
pub mod ident;
mod newtype_string;
pub mod sql_utils;
pub mod version;

pub use checksum::{compute_checksum, plan_fingerprint};
pub use column_spec::{ColumnSpec, InputType, OptionSource, SpecViolation, SqlType};
pub use config::{Config, DatabaseConfig};
pub use error::{CoreError, CoreResult};
pub use ident::{ColumnName, IndexName, TableName};
pub use version::Version;
