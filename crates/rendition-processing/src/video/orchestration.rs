//! Pipeline orchestration: download → transform → publish → cleanup.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

use rendition_core::{derive_id, Config, Job, JobId, JobOutcome, JobState, SourceId, Stage};
use rendition_storage::AssetGateway;

use super::transcoder::{TracingDiagnostics, TranscodeOptions, Transcoder};
use crate::cleanup::{cleanup, StagingGuard};
use crate::staging::{StagingArea, StagingRole};

/// Per-run settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub derived_id_prefix: String,
    pub target_height_px: u32,
    /// Remove the processed object again when publishing fails half-way.
    pub retract_partial_publish: bool,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            derived_id_prefix: config.derived_id_prefix().to_string(),
            target_height_px: config.target_height_px(),
            retract_partial_publish: config.retract_partial_publish(),
        }
    }
}

/// Runs one job at a time per call; many calls may run concurrently.
///
/// Every exit path removes the local files the job created before the outcome is
/// returned. Remote state is never rolled back unless `retract_partial_publish` is set.
pub struct PipelineOrchestrator {
    gateway: Arc<dyn AssetGateway>,
    transcoder: Arc<dyn Transcoder>,
    staging: StagingArea,
    config: OrchestratorConfig,
    transcode_permits: Option<Arc<Semaphore>>,
}

impl PipelineOrchestrator {
    pub fn new(
        gateway: Arc<dyn AssetGateway>,
        transcoder: Arc<dyn Transcoder>,
        staging: StagingArea,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            transcoder,
            staging,
            config,
            transcode_permits: None,
        }
    }

    /// Bound the number of transforms running at once across all jobs.
    pub fn with_transcode_limit(mut self, permits: usize) -> Self {
        self.transcode_permits = Some(Arc::new(Semaphore::new(permits)));
        self
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Build a job in the `Received` state with job-unique local paths.
    pub fn prepare(&self, source_id: SourceId) -> Job {
        let id = JobId::new();
        let derived_id = derive_id(&self.config.derived_id_prefix, &source_id);
        let local_raw_path = self
            .staging
            .resolve_for_job(StagingRole::Raw, id, source_id.as_str());
        let local_processed_path =
            self.staging
                .resolve_for_job(StagingRole::Processed, id, &derived_id);

        Job::new(
            id,
            source_id,
            derived_id,
            local_raw_path,
            local_processed_path,
        )
    }

    /// Prepare and run a job for `source_id`.
    pub async fn process(&self, source_id: SourceId) -> JobOutcome {
        let mut job = self.prepare(source_id);
        self.run(&mut job).await
    }

    /// Drive `job` to a terminal state and return its outcome.
    ///
    /// Only a job in the `Received` state is run. If the returned future is dropped
    /// before it completes, the job's local files are removed on drop.
    pub async fn run(&self, job: &mut Job) -> JobOutcome {
        if job.state() != JobState::Received {
            tracing::warn!(
                job_id = %job.id,
                state = %job.state(),
                "Job already started, not running it again"
            );
            return JobOutcome::Failure {
                stage: Stage::Download,
                cause: format!("job {} cannot start from state {}", job.id, job.state()),
            };
        }

        let mut guard = StagingGuard::new(vec![
            job.local_raw_path.clone(),
            job.local_processed_path.clone(),
        ]);
        let outcome = self.drive(job).await;
        guard.disarm();
        outcome
    }

    async fn drive(&self, job: &mut Job) -> JobOutcome {
        let raw_path = job.local_raw_path.clone();
        let processed_path = job.local_processed_path.clone();

        tracing::info!(
            job_id = %job.id,
            source_id = %job.source_id,
            derived_id = %job.derived_id,
            "Starting video processing"
        );

        // Download
        self.transition(job, JobState::Downloading);

        if let Err(e) = self.staging.ensure_directories().await {
            return self
                .fail(job, Stage::Download, e.to_string(), vec![raw_path])
                .await;
        }

        let fetched = self.gateway.fetch(job.source_id.as_str(), &raw_path).await;
        match fetched {
            Ok(size) => {
                tracing::info!(
                    job_id = %job.id,
                    source_id = %job.source_id,
                    size_bytes = size,
                    "Raw video downloaded"
                );
            }
            Err(e) => {
                return self
                    .fail(job, Stage::Download, e.to_string(), vec![raw_path])
                    .await;
            }
        }

        // Transform
        self.transition(job, JobState::Transforming);

        let permit = match &self.transcode_permits {
            Some(permits) => match permits.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    return self
                        .fail(
                            job,
                            Stage::Convert,
                            e.to_string(),
                            vec![raw_path, processed_path],
                        )
                        .await;
                }
            },
            None => None,
        };

        let options = TranscodeOptions::new(self.config.target_height_px);
        let diagnostics = Arc::new(TracingDiagnostics::for_job(job.id.to_string()));
        let transformed = self
            .transcoder
            .transcode(&raw_path, &processed_path, &options, diagnostics)
            .await;
        drop(permit);

        if let Err(e) = transformed {
            return self
                .fail(
                    job,
                    Stage::Convert,
                    e.to_string(),
                    vec![raw_path, processed_path],
                )
                .await;
        }

        tracing::info!(
            job_id = %job.id,
            target_height_px = self.config.target_height_px,
            "Video transformed"
        );

        // Publish
        self.transition(job, JobState::Publishing);

        let published = self
            .gateway
            .publish(&processed_path, &job.derived_id)
            .await;
        let public_url = match published {
            Ok(url) => url,
            Err(e) => {
                if self.config.retract_partial_publish {
                    self.retract(job).await;
                }
                return self
                    .fail(
                        job,
                        Stage::Upload,
                        e.to_string(),
                        vec![raw_path, processed_path],
                    )
                    .await;
            }
        };

        // Cleanup
        self.transition(job, JobState::CleaningUp);
        self.cleanup_local(job, &[raw_path, processed_path]).await;
        self.transition(job, JobState::Completed);

        tracing::info!(
            job_id = %job.id,
            source_id = %job.source_id,
            derived_id = %job.derived_id,
            public_url = %public_url,
            "Video processing completed"
        );

        JobOutcome::Success {
            derived_id: job.derived_id.clone(),
            public_url,
        }
    }

    async fn fail(
        &self,
        job: &mut Job,
        stage: Stage,
        cause: String,
        local_paths: Vec<PathBuf>,
    ) -> JobOutcome {
        tracing::error!(
            job_id = %job.id,
            source_id = %job.source_id,
            stage = %stage,
            error = %cause,
            "Video processing failed"
        );

        self.cleanup_local(job, &local_paths).await;
        self.transition(job, JobState::Failed);

        JobOutcome::Failure { stage, cause }
    }

    async fn cleanup_local(&self, job: &Job, paths: &[PathBuf]) {
        let report = cleanup(paths).await;
        if !report.is_clean() {
            tracing::warn!(
                job_id = %job.id,
                failed = report.failed.len(),
                "Local staging files left behind"
            );
        }
    }

    async fn retract(&self, job: &Job) {
        match self.gateway.remove(&job.derived_id).await {
            Ok(()) => tracing::info!(
                job_id = %job.id,
                derived_id = %job.derived_id,
                "Retracted partially published object"
            ),
            Err(e) => tracing::warn!(
                job_id = %job.id,
                derived_id = %job.derived_id,
                error = %e,
                "Failed to retract partially published object"
            ),
        }
    }

    fn transition(&self, job: &mut Job, next: JobState) {
        if let Err(e) = job.advance(next) {
            tracing::error!(job_id = %job.id, error = %e, "Job state not advanced");
        }
    }
}
