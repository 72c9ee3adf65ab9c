//! Application state shared by every handler.

use rendition_core::{Config, StorageBackend};
use rendition_processing::PipelineOrchestrator;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub storage_backend: StorageBackend,
}
