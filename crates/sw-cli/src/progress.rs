//! Terminal progress bar for upgrade runs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use sw_core::Version;
use sw_runner::ProgressSink;

/// Draws one bar per version, printing step messages above it
#[derive(Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl ProgressSink for BarProgress {
    fn version_started(&self, version: &Version, total: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.println(format!("Upgrading to {version}"));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(pb);
        }
    }

    fn task_started(&self, _index: usize, label: &str) {
        self.with_bar(|pb| pb.set_message(label.to_string()));
    }

    fn task_finished(&self, _index: usize, label: &str) {
        self.with_bar(|pb| {
            pb.println(format!("  ✓ {label}"));
            pb.inc(1);
        });
    }

    fn task_skipped(&self, _index: usize, label: &str) {
        self.with_bar(|pb| {
            pb.println(format!("  - {label} (already applied)"));
            pb.inc(1);
        });
    }

    fn message(&self, text: &str) {
        println!("{text}");
    }

    fn version_failed(&self, version: &Version, _error: &str) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.abandon_with_message(format!("failed while upgrading to {version}"));
            }
        }
    }

    fn version_finished(&self, version: &Version) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        println!("Schema is now at {version}");
    }
}
