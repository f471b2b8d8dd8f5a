//! Permanent file deletion with a per-file report.

use crate::core::raster::ImageId;
use crate::error::DeleteError;
use crate::events::{DeleteEvent, Event, EventSender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Removes files
pub trait DeletionActuator {
    /// Delete every id, recording failures instead of stopping at them
    fn delete(&self, ids: &[ImageId], events: &EventSender) -> DeletionReport;
}

/// Why a file could not be removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteFailureKind {
    AlreadyMissing,
    PermissionDenied,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub kind: DeleteFailureKind,
    pub reason: String,
}

impl From<DeleteError> for DeleteFailure {
    fn from(error: DeleteError) -> Self {
        let reason = error.to_string();
        let (path, kind) = match error {
            DeleteError::AlreadyMissing { path } => (path, DeleteFailureKind::AlreadyMissing),
            DeleteError::PermissionDenied { path } => (path, DeleteFailureKind::PermissionDenied),
            DeleteError::Io { path, .. } | DeleteError::Report { path, .. } => (path, DeleteFailureKind::Other),
        };
        Self { path, kind, reason }
    }
}

/// Outcome of a deletion batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Nothing was removed; `deleted` lists what would have been
    pub dry_run: bool,
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<DeleteFailure>,
    /// Sum of the sizes of `deleted`
    pub bytes_freed: u64,
}

impl DeletionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<(), DeleteError> {
        let report_error = |reason: String| DeleteError::Report {
            path: path.to_path_buf(),
            reason,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| report_error(e.to_string()))?;
        fs::write(path, json).map_err(|e| report_error(e.to_string()))
    }
}

/// Deletes files from the local filesystem with `remove_file`.
///
/// Deletion is permanent; nothing goes to a trash folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDeleter {
    dry_run: bool,
}

impl FileDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report what would be deleted
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn remove(&self, path: &Path) -> Result<u64, DeleteError> {
        let size = fs::metadata(path)
            .map_err(|e| DeleteError::from_io(path.to_path_buf(), e))?
            .len();

        if !self.dry_run {
            fs::remove_file(path).map_err(|e| DeleteError::from_io(path.to_path_buf(), e))?;
        }
        Ok(size)
    }
}

impl DeletionActuator for FileDeleter {
    fn delete(&self, ids: &[ImageId], events: &EventSender) -> DeletionReport {
        let started_at = Utc::now();
        events.send(Event::Delete(DeleteEvent::Started { total_files: ids.len() }));

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        let mut bytes_freed = 0u64;

        for id in ids {
            let path = id.path();
            match self.remove(path) {
                Ok(size) => {
                    bytes_freed += size;
                    events.send(Event::Delete(DeleteEvent::Deleted {
                        path: path.to_path_buf(),
                    }));
                    deleted.push(path.to_path_buf());
                }
                Err(error) => {
                    warn!("{}", error);
                    events.send(Event::Delete(DeleteEvent::Failed {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    failed.push(DeleteFailure::from(error));
                }
            }
        }

        info!(
            "{} {} files ({} bytes), {} failed",
            if self.dry_run { "would delete" } else { "deleted" },
            deleted.len(),
            bytes_freed,
            failed.len()
        );
        events.send(Event::Delete(DeleteEvent::Completed {
            deleted: deleted.len(),
            failed: failed.len(),
        }));

        DeletionReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.dry_run,
            deleted,
            failed,
            bytes_freed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::null_sender;
    use tempfile::TempDir;

    fn file(dir: &TempDir, name: &str, contents: &[u8]) -> ImageId {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        ImageId::new(path)
    }

    #[test]
    fn deletes_files_and_counts_bytes() {
        let dir = TempDir::new().unwrap();
        let a = file(&dir, "a.png", b"12345");
        let b = file(&dir, "b.png", b"123");

        let report = FileDeleter::new().delete(&[a.clone(), b.clone()], &null_sender());

        assert!(report.is_clean());
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.bytes_freed, 8);
        assert!(!a.path().exists());
        assert!(!b.path().exists());
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn missing_file_is_recorded_and_batch_continues() {
        let dir = TempDir::new().unwrap();
        let missing = ImageId::new(dir.path().join("gone.png"));
        let present = file(&dir, "here.png", b"x");

        let report = FileDeleter::new().delete(&[missing, present.clone()], &null_sender());

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kind, DeleteFailureKind::AlreadyMissing);
        assert_eq!(report.deleted, vec![present.path().to_path_buf()]);
        assert!(!present.path().exists());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let a = file(&dir, "a.png", b"abc");

        let report = FileDeleter::new().dry_run(true).delete(&[a.clone()], &null_sender());

        assert!(report.dry_run);
        assert_eq!(report.deleted, vec![a.path().to_path_buf()]);
        assert_eq!(report.bytes_freed, 3);
        assert!(a.path().exists());
    }

    #[test]
    fn report_is_written_as_json() {
        let dir = TempDir::new().unwrap();
        let a = file(&dir, "a.png", b"abc");
        let report = FileDeleter::new().delete(&[a], &null_sender());
        let report_path = dir.path().join("report.json");

        report.write_json(&report_path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(value["bytes_freed"], 3);
        assert_eq!(value["dry_run"], false);
        assert!(value["started_at"].is_string());
    }

    #[test]
    fn report_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let report = FileDeleter::new().delete(&[], &null_sender());

        let result = report.write_json(&dir.path().join("no/such/dir/report.json"));

        assert!(matches!(result, Err(DeleteError::Report { .. })));
    }
}
