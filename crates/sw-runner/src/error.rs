//! Error types for sw-runner

use sw_core::CoreError;
use sw_db::DbError;
use thiserror::Error;

/// Upgrade runner errors
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// Duplicate or malformed step registration (U001)
    #[error("[U001] Invalid registration for version {version}: {message}")]
    Registration { version: String, message: String },

    /// A column spec is inconsistent (U002)
    #[error("[U002] Column spec for {table}.{column} is invalid: {reason}")]
    SpecValidation {
        table: String,
        column: String,
        reason: String,
    },

    /// A task failed; the run halted at it (U003)
    #[error("[U003] Task {index} '{label}' failed: {source}")]
    TaskFailed {
        index: usize,
        label: String,
        source: Box<UpgradeError>,
    },

    /// Version has no registered step (U004)
    #[error("[U004] No upgrade step registered for version {version}")]
    NotFound { version: String },

    /// Target is older than what is installed (U005)
    #[error("[U005] Cannot downgrade: installed version is {installed}, target is {target}")]
    Downgrade { installed: String, target: String },

    /// Journal disagrees with the current task list (U006)
    #[error(
        "[U006] Journal for {version} recorded task {index} as '{recorded}' but the step now \
         produces '{expected}'; refusing to resume"
    )]
    ResumeMismatch {
        version: String,
        index: usize,
        recorded: String,
        expected: String,
    },

    /// Journal read/write failure (U007)
    #[error("[U007] Upgrade journal error: {0}")]
    Journal(String),

    /// Script load or render failure (U008)
    #[error("[U008] Script '{name}': {message}")]
    Script { name: String, message: String },

    /// Custom action failure (U009)
    #[error("[U009] Action '{action}' failed: {message}")]
    Action { action: String, message: String },

    /// Database error
    #[error(transparent)]
    Db(#[from] DbError),

    /// Core error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for UpgradeError
pub type UpgradeResult<T> = Result<T, UpgradeError>;

impl UpgradeError {
    /// Convert a core spec violation into the runner's variant, passing
    /// anything else through.
    pub(crate) fn from_spec_check(err: CoreError) -> Self {
        match err {
            CoreError::SpecValidation {
                table,
                column,
                reason,
            } => UpgradeError::SpecValidation {
                table,
                column,
                reason,
            },
            other => UpgradeError::Core(other),
        }
    }
}
