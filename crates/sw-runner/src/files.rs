//! Filesystem timestamps for uploaded files.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;

/// Source of file creation times.
pub trait FileTimestamps: Send + Sync {
    /// Creation time of `path` in UTC, or `None` if there is no such file.
    fn created(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Reads timestamps from file metadata.
///
/// Uses the creation time where the platform records one and the
/// modification time otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

impl FileTimestamps for LocalFiles {
    fn created(&self, path: &Path) -> Option<NaiveDateTime> {
        let meta = std::fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        let time = meta.created().or_else(|_| meta.modified()).ok()?;
        Some(DateTime::<Utc>::from(time).naive_utc())
    }
}
