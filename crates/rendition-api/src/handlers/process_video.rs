//! Trigger handler: one request runs one pipeline job to completion.

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::trigger::decode_trigger;
use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use rendition_core::{AppError, JobOutcome};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ProcessVideoResponse {
    pub job_id: String,
    pub source_id: String,
    pub derived_id: String,
    pub public_url: String,
}

/// Decode the push notification, run the job and report its terminal outcome.
///
/// Responds only after local cleanup has finished for the job.
pub async fn process_video(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let source_id = decode_trigger(&body)?;

    let mut job = state.orchestrator.prepare(source_id);
    tracing::info!(
        job_id = %job.id,
        source_id = %job.source_id,
        "Processing trigger received"
    );

    // The job runs on its own task so a dropped connection cannot abandon it half-way.
    let orchestrator = state.orchestrator.clone();
    let (job, outcome) = tokio::spawn(async move {
        let outcome = orchestrator.run(&mut job).await;
        (job, outcome)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Job task failed: {}", e)))?;

    match outcome {
        JobOutcome::Success {
            derived_id,
            public_url,
        } => Ok(Json(ProcessVideoResponse {
            job_id: job.id.to_string(),
            source_id: job.source_id.to_string(),
            derived_id,
            public_url,
        })),
        JobOutcome::Failure { stage, cause } => Err(AppError::Pipeline { stage, cause }.into()),
    }
}
