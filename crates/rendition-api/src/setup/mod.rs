//! Application setup and initialization
//!
//! Process startup: configuration validation, logging, staging directories, the remote
//! gateway, the transform step and routes.

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use rendition_core::Config;
use rendition_processing::{
    FfmpegTranscoder, OrchestratorConfig, PipelineOrchestrator, StagingArea, Transcoder,
};
use rendition_storage::AssetGateway;
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(&config)?;

    tracing::info!("Configuration loaded and validated successfully");

    // Staging directories must exist before the first trigger is accepted.
    let staging = StagingArea::from_config(&config);
    staging
        .ensure_directories()
        .await
        .context("Failed to create staging directories")?;

    let gateway = storage::setup_storage(&config).await?;

    let transcoder: Arc<dyn Transcoder> = Arc::new(
        FfmpegTranscoder::new(config.ffmpeg_path())
            .with_timeout(config.transform_timeout_secs().map(Duration::from_secs)),
    );

    let state = build_state(config.clone(), gateway, transcoder, staging);
    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}

/// Assemble the shared state from already constructed collaborators.
pub fn build_state(
    config: Config,
    gateway: Arc<dyn AssetGateway>,
    transcoder: Arc<dyn Transcoder>,
    staging: StagingArea,
) -> Arc<AppState> {
    let storage_backend = gateway.backend_type();
    let orchestrator = PipelineOrchestrator::new(
        gateway,
        transcoder,
        staging,
        OrchestratorConfig::from_config(&config),
    )
    .with_transcode_limit(config.max_concurrent_transcodes());

    tracing::info!(
        storage_backend = %storage_backend,
        target_height_px = config.target_height_px(),
        max_concurrent_transcodes = config.max_concurrent_transcodes(),
        derived_id_prefix = %config.derived_id_prefix(),
        retract_partial_publish = config.retract_partial_publish(),
        "Pipeline orchestrator initialized"
    );

    Arc::new(AppState {
        config,
        orchestrator: Arc::new(orchestrator),
        storage_backend,
    })
}
