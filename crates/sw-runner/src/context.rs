//! Per-run state shared by every task of an upgrade.

use crate::files::{FileTimestamps, LocalFiles};
use crate::progress::{LogProgress, ProgressSink};
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sw_core::{Config, Version};

/// A non-fatal problem noticed while running a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Version being applied when the warning was raised
    pub version: Option<String>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "[{v}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// State of one upgrade run.
///
/// Created when an upgrade begins and dropped when it ends. Tasks read the
/// template variables, upload directory and clock from here and push
/// warnings into it.
pub struct UpgradeContext {
    version: Option<Version>,
    domain_id: u32,
    vars: HashMap<String, serde_yaml::Value>,
    upload_dir: Option<PathBuf>,
    warnings: Vec<Warning>,
    progress: Arc<dyn ProgressSink>,
    files: Arc<dyn FileTimestamps>,
    fixed_now: Option<NaiveDateTime>,
}

impl Default for UpgradeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UpgradeContext {
    /// Context for domain 1 with no variables, logging progress.
    pub fn new() -> Self {
        Self {
            version: None,
            domain_id: 1,
            vars: HashMap::new(),
            upload_dir: None,
            warnings: Vec::new(),
            progress: Arc::new(LogProgress),
            files: Arc::new(LocalFiles),
            fixed_now: None,
        }
    }

    /// Context populated from configuration, with target variable overrides.
    pub fn from_config(config: &Config, root: &Path, target: Option<&str>) -> Self {
        Self::new()
            .with_domain_id(config.domain_id)
            .with_vars(config.get_merged_vars(target).into_owned())
            .with_upload_dir_opt(config.upload_dir_absolute(root))
    }

    pub fn with_domain_id(mut self, domain_id: u32) -> Self {
        self.domain_id = domain_id;
        self
    }

    pub fn with_vars(mut self, vars: HashMap<String, serde_yaml::Value>) -> Self {
        self.vars = vars;
        self
    }

    pub fn with_upload_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.with_upload_dir_opt(Some(dir.into()))
    }

    fn with_upload_dir_opt(mut self, dir: Option<PathBuf>) -> Self {
        self.upload_dir = dir;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_files(mut self, files: Arc<dyn FileTimestamps>) -> Self {
        self.files = files;
        self
    }

    /// Pin the clock, so "now" is the same value for every call.
    pub fn with_fixed_now(mut self, now: NaiveDateTime) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Version currently being applied.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub(crate) fn set_version(&mut self, version: Option<Version>) {
        self.version = version;
    }

    pub fn domain_id(&self) -> u32 {
        self.domain_id
    }

    pub fn vars(&self) -> &HashMap<String, serde_yaml::Value> {
        &self.vars
    }

    pub fn upload_dir(&self) -> Option<&Path> {
        self.upload_dir.as_deref()
    }

    pub fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }

    pub fn files(&self) -> &dyn FileTimestamps {
        self.files.as_ref()
    }

    /// Current UTC time, or the pinned time.
    pub fn now(&self) -> NaiveDateTime {
        self.fixed_now.unwrap_or_else(|| Utc::now().naive_utc())
    }

    /// Record a non-fatal problem against the current version.
    pub fn warn(&mut self, message: impl Into<String>) {
        let warning = Warning {
            version: self.version.as_ref().map(ToString::to_string),
            message: message.into(),
        };
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Remove and return the warnings accumulated since the last call.
    pub(crate) fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Put previously taken warnings back ahead of the current ones.
    pub(crate) fn restore_warnings(&mut self, mut earlier: Vec<Warning>) {
        earlier.append(&mut self.warnings);
        self.warnings = earlier;
    }
}
