//! Local staging area: one directory for raw downloads, one for transform output.

use rendition_core::{Config, JobId};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingRole {
    Raw,
    Processed,
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    raw_root: PathBuf,
    processed_root: PathBuf,
}

impl StagingArea {
    pub fn new(raw_root: impl Into<PathBuf>, processed_root: impl Into<PathBuf>) -> Self {
        Self {
            raw_root: raw_root.into(),
            processed_root: processed_root.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.raw_staging_dir().clone(),
            config.processed_staging_dir().clone(),
        )
    }

    pub fn root(&self, role: StagingRole) -> &Path {
        match role {
            StagingRole::Raw => &self.raw_root,
            StagingRole::Processed => &self.processed_root,
        }
    }

    /// Create both staging roots, including missing parents. Safe to call repeatedly.
    pub async fn ensure_directories(&self) -> Result<(), StagingError> {
        for root in [&self.raw_root, &self.processed_root] {
            tokio::fs::create_dir_all(root)
                .await
                .map_err(|source| StagingError::CreateDir {
                    path: root.clone(),
                    source,
                })?;
        }

        tracing::debug!(
            raw_root = %self.raw_root.display(),
            processed_root = %self.processed_root.display(),
            "Staging directories ready"
        );
        Ok(())
    }

    /// `<root>/<file_name>` for the given role. No I/O.
    pub fn resolve(&self, role: StagingRole, file_name: &str) -> PathBuf {
        self.root(role).join(file_name)
    }

    /// Local path for `id` within one job. Prefixing with the job id keeps two
    /// concurrent jobs for the same object from sharing files.
    pub fn resolve_for_job(&self, role: StagingRole, job_id: JobId, id: &str) -> PathBuf {
        self.resolve(role, &format!("{}-{}", job_id, id))
    }
}
