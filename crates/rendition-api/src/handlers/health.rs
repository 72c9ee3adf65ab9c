//! Liveness and health handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rendition_processing::StagingRole;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub environment: String,
    pub storage_backend: String,
    pub raw_staging: String,
    pub processed_staging: String,
}

pub async fn root() -> &'static str {
    "Rendition service is running"
}

async fn check_directory(path: &Path) -> String {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => "healthy".to_string(),
        Ok(_) => format!("unhealthy: {} is not a directory", path.display()),
        Err(e) => format!("unhealthy: {}", e),
    }
}

/// Reports whether both staging roots are usable, plus the configured gateway backend.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let staging = state.orchestrator.staging();
    let raw_staging = check_directory(staging.root(StagingRole::Raw)).await;
    let processed_staging = check_directory(staging.root(StagingRole::Processed)).await;

    let healthy = raw_staging == "healthy" && processed_staging == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        tracing::warn!(
            raw_staging = %raw_staging,
            processed_staging = %processed_staging,
            "Health check failed"
        );
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            environment: state.config.environment().to_string(),
            storage_backend: state.storage_backend.to_string(),
            raw_staging,
            processed_staging,
        }),
    )
}
