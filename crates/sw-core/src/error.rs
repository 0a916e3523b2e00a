//! Error types for sw-core

use thiserror::Error;

/// Core error type for Stepwise
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Malformed version string
    #[error("[E004] Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// E005: Unrecognised SQL type in a column spec
    #[error("[E005] Unsupported SQL type '{sql_type}'")]
    UnsupportedSqlType { sql_type: String },

    /// E006: Column spec is internally inconsistent
    #[error("[E006] Column spec for {table}.{column} is invalid: {reason}")]
    SpecValidation {
        table: String,
        column: String,
        reason: String,
    },

    /// E007: IO error with file path context
    #[error("[E007] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
