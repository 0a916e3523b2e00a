//! sw-runner - Versioned schema upgrades for Stepwise
//!
//! A [`StepRegistry`] maps each version to its upgrade step. Resolving a
//! version yields an ordered list of [`Task`]s, which the [`Executor`] runs
//! one at a time. The [`Upgrader`] drives several versions in a row and
//! keeps a [`Journal`] in the target database so an interrupted upgrade
//! resumes where it stopped.

pub mod actions;
pub mod alter;
pub mod context;
pub mod error;
pub mod executor;
pub mod files;
pub mod journal;
pub mod progress;
pub mod queue;
pub mod registry;
pub mod script;
pub mod steps;
pub mod task;
pub mod upgrader;

pub use alter::AlterOutcome;
pub use context::{UpgradeContext, Warning};
pub use error::{UpgradeError, UpgradeResult};
pub use executor::{Executor, RunSummary};
pub use files::{FileTimestamps, LocalFiles};
pub use journal::Journal;
pub use progress::{LogProgress, ProgressEvent, ProgressSink, RecordingProgress};
pub use queue::TaskList;
pub use registry::{RegistryBuilder, StepDefinition, StepFn, StepRegistry};
pub use script::ScriptCatalog;
pub use task::{ScriptSource, Task, UpgradeAction};
pub use upgrader::{PlannedVersion, UpgradeStatus, Upgrader};
