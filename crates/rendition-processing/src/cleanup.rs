//! Best-effort removal of local staging files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What happened to each path handed to [`cleanup`].
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub already_absent: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every path, continuing past individual failures.
///
/// A missing path counts as already clean. Failures are logged and reported but
/// never returned as an error: the job outcome is decided before cleanup runs.
pub async fn cleanup<P: AsRef<Path>>(paths: &[P]) -> CleanupReport {
    let mut report = CleanupReport::default();

    for path in paths {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Deleted staging file");
                report.removed.push(path.to_path_buf());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Staging file does not exist");
                report.already_absent.push(path.to_path_buf());
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to delete staging file"
                );
                report.failed.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    report
}

/// Removes its paths when dropped while still armed.
///
/// Held for the lifetime of a job run so that a run abandoned mid-way, for example
/// because its future was dropped, does not leave staging files behind.
#[derive(Debug)]
pub struct StagingGuard {
    paths: Vec<PathBuf>,
    armed: bool,
}

impl StagingGuard {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, armed: true }
    }

    /// The run reached a terminal state and did its own cleanup.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        // Drop cannot await, so removal is synchronous here.
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    tracing::warn!(path = %path.display(), "Deleted staging file of abandoned job");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to delete staging file of abandoned job"
                    );
                }
            }
        }
    }
}
