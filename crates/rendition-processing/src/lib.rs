//! Rendition Processing Library
//!
//! Local staging, cleanup, the FFmpeg transform step and the pipeline orchestrator
//! that sequences download, transform, publish and cleanup for one job.

pub mod cleanup;
pub mod staging;
pub mod video;

pub use cleanup::{cleanup, CleanupReport, StagingGuard};
pub use staging::{StagingArea, StagingError, StagingRole};
pub use video::{
    DiagnosticSink, FfmpegCommand, FfmpegTranscoder, OrchestratorConfig, PipelineOrchestrator,
    TracingDiagnostics, TranscodeError, TranscodeOptions, Transcoder,
};
