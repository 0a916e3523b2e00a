//! Progress notifications emitted while an upgrade runs.

use std::sync::{Arc, Mutex};
use sw_core::Version;

/// Write-only sink for upgrade progress.
///
/// Methods have empty default bodies so a sink only implements what it shows.
pub trait ProgressSink: Send + Sync {
    /// A version is about to run `total` tasks.
    fn version_started(&self, _version: &Version, _total: usize) {}

    fn task_started(&self, _index: usize, _label: &str) {}

    fn task_finished(&self, _index: usize, _label: &str) {}

    /// A task was not run because the journal shows it already committed.
    fn task_skipped(&self, _index: usize, _label: &str) {}

    /// Free-form text such as a step's pre- or post-upgrade message.
    fn message(&self, _text: &str) {}

    fn version_finished(&self, _version: &Version) {}

    /// The version stopped at a failing task; nothing more runs.
    fn version_failed(&self, _version: &Version, _error: &str) {}
}

/// Forwards progress to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn version_started(&self, version: &Version, total: usize) {
        log::info!("Upgrading to {version} ({total} tasks)");
    }

    fn task_started(&self, index: usize, label: &str) {
        log::debug!("task {index} started: {label}");
    }

    fn task_finished(&self, index: usize, label: &str) {
        log::info!("  [{index}] {label}");
    }

    fn task_skipped(&self, index: usize, label: &str) {
        log::info!("  [{index}] {label} (already applied)");
    }

    fn message(&self, text: &str) {
        log::info!("{text}");
    }

    fn version_finished(&self, version: &Version) {
        log::info!("Schema is now at {version}");
    }

    fn version_failed(&self, version: &Version, error: &str) {
        log::error!("Upgrade to {version} stopped: {error}");
    }
}

/// One recorded progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    VersionStarted { version: String, total: usize },
    TaskStarted { index: usize, label: String },
    TaskFinished { index: usize, label: String },
    TaskSkipped { index: usize, label: String },
    Message(String),
    VersionFinished { version: String },
    VersionFailed { version: String },
}

/// Records every notification in order; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Labels of finished tasks, in completion order.
    pub fn finished_labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::TaskFinished { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressSink for RecordingProgress {
    fn version_started(&self, version: &Version, total: usize) {
        self.push(ProgressEvent::VersionStarted {
            version: version.to_string(),
            total,
        });
    }

    fn task_started(&self, index: usize, label: &str) {
        self.push(ProgressEvent::TaskStarted {
            index,
            label: label.to_string(),
        });
    }

    fn task_finished(&self, index: usize, label: &str) {
        self.push(ProgressEvent::TaskFinished {
            index,
            label: label.to_string(),
        });
    }

    fn task_skipped(&self, index: usize, label: &str) {
        self.push(ProgressEvent::TaskSkipped {
            index,
            label: label.to_string(),
        });
    }

    fn message(&self, text: &str) {
        self.push(ProgressEvent::Message(text.to_string()));
    }

    fn version_finished(&self, version: &Version) {
        self.push(ProgressEvent::VersionFinished {
            version: version.to_string(),
        });
    }

    fn version_failed(&self, version: &Version, _error: &str) {
        self.push(ProgressEvent::VersionFailed {
            version: version.to_string(),
        });
    }
}
